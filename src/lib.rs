pub mod config;
pub mod db;
pub mod leaderboard;
pub mod models;
pub mod pipeline;
pub mod platforms;
pub mod refresh;
pub mod score;
pub mod seed;
