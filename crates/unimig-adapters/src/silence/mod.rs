mod file;

pub use file::FileSilenceWriter;
