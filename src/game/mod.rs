//! Game-side state: the progression controller and the five mini-game
//! engines that feed it.

pub mod matching;
pub mod progress;
pub mod puzzle;
pub mod quiz_final;
pub mod quiz_terre;
pub mod rng;
pub mod transmutation;
