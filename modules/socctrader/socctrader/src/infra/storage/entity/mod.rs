pub mod country;
pub mod financial_action;
pub mod game;
pub mod league;
pub mod region;
pub mod team;
