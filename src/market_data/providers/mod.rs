pub(crate) mod twse_provider;
pub(crate) mod yahoo_provider;
