pub mod chart;
pub mod controls;
pub mod dataset;
pub mod debug;
pub mod landing;
pub mod text_input;
pub mod upload;
