pub(crate) mod dispatch;
pub(crate) mod enrich;
pub(crate) mod fanout;
