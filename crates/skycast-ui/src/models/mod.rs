pub mod session;
pub mod weather_model;
