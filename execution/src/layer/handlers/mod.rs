mod auction;
mod catalog;
mod factory;
mod registry;
