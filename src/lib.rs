pub mod camera;
pub mod debug;
pub mod enemy;
pub mod game;
pub mod input;
pub mod level;
pub mod path;
pub mod player;
pub mod ron;
pub mod settings;
pub mod ui;
