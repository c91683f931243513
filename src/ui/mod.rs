pub mod figure;
pub mod panels;
pub mod plot;
