use canonical::Fingerprint;
use hashbrown::HashSet;
use ingest::Collection;

/// Union of the fingerprint sets of every existing participant collection.
#[derive(Debug, Clone, Default)]
pub struct UsedEntries {
    fingerprints: HashSet<Fingerprint>,
}

impl UsedEntries {
    pub fn from_collections<'a, I>(collections: I) -> Self
    where
        I: IntoIterator<Item = &'a Collection>,
    {
        let mut fingerprints = HashSet::new();
        for collection in collections {
            fingerprints.extend(collection.fingerprint_set().iter().cloned());
        }
        Self { fingerprints }
    }

    pub fn contains(&self, fp: &Fingerprint) -> bool {
        self.fingerprints.contains(fp)
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canonical::fingerprint;
    use serde_json::json;

    #[test]
    fn unions_all_collections() {
        let a = Collection::from_records("a", vec![json!(1), json!(2)]);
        let b = Collection::from_records("b", vec![json!(2), json!(3)]);
        let used = UsedEntries::from_collections([&a, &b]);
        assert_eq!(used.len(), 3);
        assert!(used.contains(&fingerprint(&json!(3))));
        assert!(!used.contains(&fingerprint(&json!(4))));
    }

    #[test]
    fn empty_input_is_empty() {
        let used = UsedEntries::from_collections(std::iter::empty::<&Collection>());
        assert!(used.is_empty());
    }
}
