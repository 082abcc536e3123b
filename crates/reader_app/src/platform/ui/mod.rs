pub(crate) mod answer_layout;
pub(crate) mod constants;
pub(crate) mod layout;
pub(crate) mod render;
