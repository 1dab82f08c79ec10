use crate::config::{ObjectDescriptor, PortfolioConfig};

struct CatalogEntry {
    descriptor: ObjectDescriptor,
    needles: Vec<String>,
}

/// Ordered descriptor table with lowercase match needles (key first, then synonyms).
pub struct InteractionCatalog {
    entries: Vec<CatalogEntry>,
}

impl InteractionCatalog {
    pub fn from_config(config: &PortfolioConfig) -> Self {
        let entries = config
            .objects
            .iter()
            .map(|descriptor| {
                let mut needles = vec![descriptor.key.to_lowercase()];
                for synonym in config.synonyms_for(&descriptor.key) {
                    let synonym = synonym.to_lowercase();
                    if !synonym.is_empty() && !needles.contains(&synonym) {
                        needles.push(synonym);
                    }
                }
                CatalogEntry {
                    descriptor: descriptor.clone(),
                    needles,
                }
            })
            .collect();
        Self { entries }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn descriptor(&self, index: usize) -> Option<&ObjectDescriptor> {
        self.entries.get(index).map(|entry| &entry.descriptor)
    }

    /// Index of the first descriptor whose key or synonym occurs in `name`,
    /// ignoring case.
    pub fn match_name(&self, name: &str) -> Option<usize> {
        let name = name.to_lowercase();
        if name.is_empty() {
            return None;
        }
        self.entries.iter().position(|entry| {
            entry
                .needles
                .iter()
                .any(|needle| name.contains(needle.as_str()))
        })
    }
}
