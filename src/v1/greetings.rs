pub mod complex_greeting;
pub mod simple_greeting;
pub mod version;
