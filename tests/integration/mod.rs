//! Integration tests across modules.

mod fitting;
mod functional_model;
mod lm_algorithm;
mod multicosine;
mod simulator;
mod symbolic;
