pub mod birthday;
pub mod child;
