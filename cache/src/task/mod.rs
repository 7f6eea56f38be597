pub(crate) mod janitor;
