pub mod book;

pub mod import;

pub mod item;

pub mod session;

pub mod store;

pub mod validation;

pub mod view;
