pub mod driver;

pub use driver::TickDriver;
