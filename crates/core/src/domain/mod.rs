pub mod calculation;
pub mod site;
