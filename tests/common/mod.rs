pub mod scene;
pub mod test_utils;
