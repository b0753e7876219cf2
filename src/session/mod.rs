pub mod answer;
pub mod cursor;
pub mod result;
pub mod token;
