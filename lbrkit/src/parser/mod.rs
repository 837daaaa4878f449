pub mod library;
pub mod xml;

// Re-export for convenience
pub use library::LibraryDocument;
pub use xml::{Element, Node, XmlDocument, XmlError, XmlParser};
