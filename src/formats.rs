use std::collections::BTreeSet;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatCategory {
    pub category: &'static str,
    pub display_names: &'static [&'static str],
    pub extensions: &'static [&'static str],
}

const CATEGORIES: [FormatCategory; 5] = [
    FormatCategory {
        category: "Documents",
        display_names: &["Word (.docx, .doc)", "PDF", "EPub"],
        extensions: &["docx", "doc", "pdf", "epub"],
    },
    FormatCategory {
        category: "Spreadsheets",
        display_names: &["Excel (.xlsx, .xls)"],
        extensions: &["xlsx", "xls"],
    },
    FormatCategory {
        category: "Presentations",
        display_names: &["PowerPoint (.pptx, .ppt)"],
        extensions: &["pptx", "ppt"],
    },
    FormatCategory {
        category: "Web",
        display_names: &["HTML", "YouTube URLs"],
        extensions: &["html", "htm"],
    },
    FormatCategory {
        category: "Others",
        display_names: &["CSV", "JSON", "XML", "ZIP (iterates over contents)"],
        extensions: &["csv", "json", "xml", "zip"],
    },
];

pub fn categories() -> &'static [FormatCategory] {
    &CATEGORIES
}

pub fn all_extensions() -> BTreeSet<&'static str> {
    CATEGORIES
        .iter()
        .flat_map(|entry| entry.extensions.iter().copied())
        .collect()
}

/// Case-insensitive allow-list check; `ext` is given without the leading dot.
pub fn is_supported(ext: &str) -> bool {
    let ext = ext.to_ascii_lowercase();
    CATEGORIES
        .iter()
        .any(|entry| entry.extensions.contains(&ext.as_str()))
}
