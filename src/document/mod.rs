pub mod builder;
pub mod psd_file;
pub mod source;
pub mod tree;
