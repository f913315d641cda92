use std::collections::{HashSet, VecDeque};

/// FIFO queue of discovered URLs plus the set of visited ones
///
/// A URL is never both queued and visited: popping moves it from one set to
/// the other, and pushing refuses anything already seen. The number of
/// pending URLs is capped so a site with unbounded distinct links cannot
/// grow the queue without limit.
#[derive(Debug)]
pub struct CrawlFrontier {
    queue: VecDeque<String>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    capacity: usize,
}

impl CrawlFrontier {
    pub fn new(start_url: &str, capacity: usize) -> Self {
        let mut frontier = Self {
            queue: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
            capacity: capacity.max(1),
        };
        frontier.push(start_url);
        frontier
    }

    /// Enqueue a URL unless it was already seen or the queue is full
    pub fn push(&mut self, url: &str) -> bool {
        if self.visited.contains(url)
            || self.queued.contains(url)
            || self.queue.len() >= self.capacity
        {
            return false;
        }
        self.queued.insert(url.to_string());
        self.queue.push_back(url.to_string());
        true
    }

    /// Pop the oldest pending URL and mark it visited
    pub fn pop(&mut self) -> Option<String> {
        let url = self.queue.pop_front()?;
        self.queued.remove(&url);
        self.visited.insert(url.clone());
        Some(url)
    }

    #[cfg(test)]
    fn is_queued(&self, url: &str) -> bool {
        self.queued.contains(url)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}
