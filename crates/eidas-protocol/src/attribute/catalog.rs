//! Immutable attribute catalog.

use std::collections::HashMap;

use super::transliteration::{is_latin_script, transliterate};
use super::{AttributeDefinition, AttributeError, AttributeValue, AttributeValueType, TypedValue};

/// Map from attribute definition to its ordered values.
///
/// Definitions keep insertion order. Name URIs are unique; friendly names
/// may be shared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeCatalog {
    entries: Vec<(AttributeDefinition, Vec<AttributeValue>)>,
    by_name_uri: HashMap<String, usize>,
    by_friendly_name: HashMap<String, Vec<usize>>,
}

impl AttributeCatalog {
    /// An empty catalog.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Starts a new builder.
    #[must_use]
    pub fn builder() -> AttributeCatalogBuilder {
        AttributeCatalogBuilder::default()
    }

    /// Builder seeded with this catalog's entries.
    #[must_use]
    pub fn to_builder(&self) -> AttributeCatalogBuilder {
        AttributeCatalogBuilder {
            entries: self.entries.clone(),
            errors: Vec::new(),
        }
    }

    /// Definition and values for a name URI.
    #[must_use]
    pub fn get(&self, name_uri: &str) -> Option<(&AttributeDefinition, &[AttributeValue])> {
        self.by_name_uri.get(name_uri).map(|&i| {
            let (definition, values) = &self.entries[i];
            (definition, values.as_slice())
        })
    }

    /// Definition for a name URI.
    #[must_use]
    pub fn definition(&self, name_uri: &str) -> Option<&AttributeDefinition> {
        self.get(name_uri).map(|(definition, _)| definition)
    }

    /// Values for a name URI, empty when absent.
    #[must_use]
    pub fn values(&self, name_uri: &str) -> &[AttributeValue] {
        match self.get(name_uri) {
            Some((_, values)) => values,
            None => &[],
        }
    }

    /// First value for a name URI.
    #[must_use]
    pub fn first_value(&self, name_uri: &str) -> Option<&AttributeValue> {
        self.values(name_uri).first()
    }

    /// Definitions sharing a friendly name.
    pub fn by_friendly_name<'a>(
        &'a self,
        friendly_name: &str,
    ) -> impl Iterator<Item = &'a AttributeDefinition> + 'a {
        self.by_friendly_name
            .get(friendly_name)
            .into_iter()
            .flatten()
            .map(|&i| &self.entries[i].0)
    }

    /// Whether a definition with this name URI is present.
    #[must_use]
    pub fn contains(&self, name_uri: &str) -> bool {
        self.by_name_uri.contains_key(name_uri)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&AttributeDefinition, &[AttributeValue])> {
        self.entries
            .iter()
            .map(|(definition, values)| (definition, values.as_slice()))
    }

    /// Definitions in insertion order.
    pub fn definitions(&self) -> impl Iterator<Item = &AttributeDefinition> {
        self.entries.iter().map(|(definition, _)| definition)
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy with the values of one attribute replaced. Unknown name URIs
    /// leave the catalog unchanged.
    #[must_use]
    pub fn with_values(&self, name_uri: &str, values: Vec<AttributeValue>) -> Self {
        let mut next = self.clone();
        if let Some(&i) = next.by_name_uri.get(name_uri) {
            next.entries[i].1 = values;
        }
        next
    }
}

/// Append-only builder for [`AttributeCatalog`].
///
/// Problems are collected as entries are added and reported by
/// [`build`](Self::build).
#[derive(Debug, Default)]
pub struct AttributeCatalogBuilder {
    entries: Vec<(AttributeDefinition, Vec<AttributeValue>)>,
    errors: Vec<AttributeError>,
}

impl AttributeCatalogBuilder {
    /// Adds a definition with decoded values.
    #[must_use]
    pub fn put(mut self, definition: AttributeDefinition, values: Vec<AttributeValue>) -> Self {
        if let Some((existing, _)) = self
            .entries
            .iter()
            .find(|(d, _)| d.name_uri == definition.name_uri)
        {
            let error = if *existing == definition {
                AttributeError::DuplicateDefinition(definition.name_uri.clone())
            } else {
                AttributeError::NonUniqueNameUri(definition.name_uri.clone())
            };
            self.errors.push(error);
            return self;
        }
        self.entries.push((definition, values));
        self
    }

    /// Adds a definition without values, as requests do.
    #[must_use]
    pub fn put_definition(self, definition: AttributeDefinition) -> Self {
        self.put(definition, Vec::new())
    }

    /// Adds a definition with wire values decoded through its codec.
    ///
    /// When the definition requires transliteration, each non-Latin string is
    /// stored as a transliterated primary followed by the original flagged as
    /// the non-Latin alternate.
    #[must_use]
    pub fn put_str<S: AsRef<str>>(mut self, definition: AttributeDefinition, raw: &[S]) -> Self {
        let mut values = Vec::with_capacity(raw.len());
        for value in raw {
            let value = value.as_ref();
            match definition.value_type.unmarshal(value) {
                Ok(TypedValue::String(text))
                    if definition.transliteration_mandatory
                        && definition.value_type == AttributeValueType::String
                        && !is_latin_script(&text) =>
                {
                    values.push(AttributeValue::string(transliterate(&text)));
                    values.push(AttributeValue::string(text).as_non_latin_alternate());
                }
                Ok(typed) => values.push(AttributeValue::new(typed)),
                Err(reason) => {
                    self.errors.push(AttributeError::InvalidValue {
                        name_uri: definition.name_uri.clone(),
                        reason,
                    });
                    return self;
                }
            }
        }
        self.put(definition, values)
    }

    /// Builds the catalog.
    ///
    /// ## Errors
    ///
    /// Returns the first problem recorded while adding entries.
    pub fn build(self) -> Result<AttributeCatalog, AttributeError> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }

        let mut by_name_uri = HashMap::with_capacity(self.entries.len());
        let mut by_friendly_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, (definition, _)) in self.entries.iter().enumerate() {
            by_name_uri.insert(definition.name_uri.clone(), i);
            by_friendly_name
                .entry(definition.friendly_name.clone())
                .or_default()
                .push(i);
        }

        Ok(AttributeCatalog {
            entries: self.entries,
            by_name_uri,
            by_friendly_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{eidas_registry, uris, PersonType};

    fn registered(name_uri: &str) -> AttributeDefinition {
        eidas_registry().get(name_uri).cloned().unwrap()
    }

    #[test]
    fn duplicate_definition_is_rejected() {
        let result = AttributeCatalog::builder()
            .put_str(registered(uris::PERSON_IDENTIFIER), &["ES/BE/1"])
            .put_str(registered(uris::PERSON_IDENTIFIER), &["ES/BE/2"])
            .build();
        assert!(matches!(result, Err(AttributeError::DuplicateDefinition(_))));
    }

    #[test]
    fn conflicting_name_uri_is_rejected() {
        let impostor = AttributeDefinition::new(
            uris::PERSON_IDENTIFIER,
            "Other",
            PersonType::NaturalPerson,
            AttributeValueType::String,
        );
        let result = AttributeCatalog::builder()
            .put_definition(registered(uris::PERSON_IDENTIFIER))
            .put_definition(impostor)
            .build();
        assert!(matches!(result, Err(AttributeError::NonUniqueNameUri(_))));
    }

    #[test]
    fn non_latin_values_are_transliterated() {
        let catalog = AttributeCatalog::builder()
            .put_str(registered(uris::CURRENT_FAMILY_NAME), &["Παπαδόπουλος"])
            .put_str(registered(uris::CURRENT_GIVEN_NAME), &["Javier"])
            .build()
            .unwrap();

        let family = catalog.values(uris::CURRENT_FAMILY_NAME);
        assert_eq!(family.len(), 2);
        assert!(!family[0].non_latin_script_alternate);
        assert!(is_latin_script(&family[0].marshal()));
        assert!(family[1].non_latin_script_alternate);
        assert_eq!(family[1].marshal(), "Παπαδόπουλος");

        assert_eq!(catalog.values(uris::CURRENT_GIVEN_NAME).len(), 1);
    }

    #[test]
    fn codec_failures_are_reported() {
        let result = AttributeCatalog::builder()
            .put_str(registered(uris::DATE_OF_BIRTH), &["yesterday"])
            .build();
        assert!(matches!(result, Err(AttributeError::InvalidValue { .. })));
    }

    #[test]
    fn indexes_and_replacement() {
        let catalog = AttributeCatalog::builder()
            .put_str(registered(uris::PERSON_IDENTIFIER), &["12345"])
            .put_definition(registered(uris::DATE_OF_BIRTH))
            .build()
            .unwrap();

        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains(uris::DATE_OF_BIRTH));
        assert_eq!(catalog.by_friendly_name("PersonIdentifier").count(), 1);

        let replaced = catalog.with_values(
            uris::PERSON_IDENTIFIER,
            vec![AttributeValue::string("ES/BE/12345")],
        );
        assert_eq!(
            replaced.first_value(uris::PERSON_IDENTIFIER).map(AttributeValue::marshal),
            Some("ES/BE/12345".to_string())
        );
        assert_eq!(
            catalog.first_value(uris::PERSON_IDENTIFIER).map(AttributeValue::marshal),
            Some("12345".to_string())
        );
    }
}
