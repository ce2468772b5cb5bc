mod interaction;
mod view;

pub(in crate::app) use interaction::KeyAction;
