pub mod driver;

pub use driver::{BrowserSession, WebPage};
