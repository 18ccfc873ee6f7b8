pub mod check;
pub mod codecs;
pub mod record;
pub mod simulate;
