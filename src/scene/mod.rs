pub mod test_scene;
