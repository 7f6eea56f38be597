// Configuration parsing and validation.

pub mod processed; // Validated settings handed to the initializer
pub mod raw; // Structs directly mapping to the YAML structure
