//! Registry of the standard eIDAS attribute definitions.

use std::collections::HashMap;
use std::sync::LazyLock;

use super::{AttributeDefinition, AttributeValueType, PersonType};

/// Name URIs of the standard eIDAS attributes.
pub mod uris {
    // ========================================================================
    // Natural person
    // ========================================================================

    /// Unique identifier of a natural person.
    pub const PERSON_IDENTIFIER: &str =
        "http://eidas.europa.eu/attributes/naturalperson/PersonIdentifier";
    /// Current family name.
    pub const CURRENT_FAMILY_NAME: &str =
        "http://eidas.europa.eu/attributes/naturalperson/CurrentFamilyName";
    /// Current given name.
    pub const CURRENT_GIVEN_NAME: &str =
        "http://eidas.europa.eu/attributes/naturalperson/CurrentGivenName";
    /// Date of birth.
    pub const DATE_OF_BIRTH: &str = "http://eidas.europa.eu/attributes/naturalperson/DateOfBirth";
    /// Birth name.
    pub const BIRTH_NAME: &str = "http://eidas.europa.eu/attributes/naturalperson/BirthName";
    /// Place of birth.
    pub const PLACE_OF_BIRTH: &str = "http://eidas.europa.eu/attributes/naturalperson/PlaceOfBirth";
    /// Current address.
    pub const CURRENT_ADDRESS: &str =
        "http://eidas.europa.eu/attributes/naturalperson/CurrentAddress";
    /// Gender.
    pub const GENDER: &str = "http://eidas.europa.eu/attributes/naturalperson/Gender";

    // ========================================================================
    // Legal person
    // ========================================================================

    /// Unique identifier of a legal person.
    pub const LEGAL_PERSON_IDENTIFIER: &str =
        "http://eidas.europa.eu/attributes/legalperson/LegalPersonIdentifier";
    /// Legal name.
    pub const LEGAL_NAME: &str = "http://eidas.europa.eu/attributes/legalperson/LegalName";
    /// Registered address.
    pub const LEGAL_ADDRESS: &str =
        "http://eidas.europa.eu/attributes/legalperson/LegalPersonAddress";
    /// VAT registration number.
    pub const VAT_REGISTRATION: &str =
        "http://eidas.europa.eu/attributes/legalperson/VATRegistrationNumber";
    /// Tax reference number.
    pub const TAX_REFERENCE: &str = "http://eidas.europa.eu/attributes/legalperson/TaxReference";
    /// Directive 2012/17/EU identifier.
    pub const EU_IDENTIFIER: &str =
        "http://eidas.europa.eu/attributes/legalperson/D-2012-17-EUIdentifier";
    /// Legal entity identifier.
    pub const LEI: &str = "http://eidas.europa.eu/attributes/legalperson/LEI";
    /// Economic operator registration and identification.
    pub const EORI: &str = "http://eidas.europa.eu/attributes/legalperson/EORI";
    /// System for exchange of excise data identifier.
    pub const SEED: &str = "http://eidas.europa.eu/attributes/legalperson/SEED";
    /// Standard industrial classification.
    pub const SIC: &str = "http://eidas.europa.eu/attributes/legalperson/SIC";

    // ========================================================================
    // Representatives
    // ========================================================================

    /// Unique identifier of a representing natural person.
    pub const REPRESENTATIVE_PERSON_IDENTIFIER: &str =
        "http://eidas.europa.eu/attributes/naturalperson/representative/PersonIdentifier";
    /// Family name of a representing natural person.
    pub const REPRESENTATIVE_FAMILY_NAME: &str =
        "http://eidas.europa.eu/attributes/naturalperson/representative/CurrentFamilyName";
    /// Given name of a representing natural person.
    pub const REPRESENTATIVE_GIVEN_NAME: &str =
        "http://eidas.europa.eu/attributes/naturalperson/representative/CurrentGivenName";
    /// Date of birth of a representing natural person.
    pub const REPRESENTATIVE_DATE_OF_BIRTH: &str =
        "http://eidas.europa.eu/attributes/naturalperson/representative/DateOfBirth";
    /// Unique identifier of a representing legal person.
    pub const REPRESENTATIVE_LEGAL_PERSON_IDENTIFIER: &str =
        "http://eidas.europa.eu/attributes/legalperson/representative/LegalPersonIdentifier";
    /// Legal name of a representing legal person.
    pub const REPRESENTATIVE_LEGAL_NAME: &str =
        "http://eidas.europa.eu/attributes/legalperson/representative/LegalName";

    /// Identifier attributes whose values start with the issuing country.
    pub const COUNTRY_PREFIXED_IDENTIFIERS: [&str; 4] = [
        PERSON_IDENTIFIER,
        LEGAL_PERSON_IDENTIFIER,
        REPRESENTATIVE_PERSON_IDENTIFIER,
        REPRESENTATIVE_LEGAL_PERSON_IDENTIFIER,
    ];
}

/// A fixed set of attribute definitions indexed by name URI and friendly
/// name.
#[derive(Debug)]
pub struct AttributeRegistry {
    definitions: Vec<AttributeDefinition>,
    by_name_uri: HashMap<String, usize>,
    by_friendly_name: HashMap<String, usize>,
}

impl AttributeRegistry {
    /// Indexes the given definitions. Later duplicates are ignored.
    #[must_use]
    pub fn new(definitions: Vec<AttributeDefinition>) -> Self {
        let mut kept = Vec::with_capacity(definitions.len());
        let mut by_name_uri = HashMap::new();
        let mut by_friendly_name = HashMap::new();
        for definition in definitions {
            if by_name_uri.contains_key(&definition.name_uri) {
                continue;
            }
            by_name_uri.insert(definition.name_uri.clone(), kept.len());
            by_friendly_name
                .entry(definition.friendly_name.clone())
                .or_insert(kept.len());
            kept.push(definition);
        }
        Self {
            definitions: kept,
            by_name_uri,
            by_friendly_name,
        }
    }

    /// Definition for a name URI.
    #[must_use]
    pub fn get(&self, name_uri: &str) -> Option<&AttributeDefinition> {
        self.by_name_uri.get(name_uri).map(|&i| &self.definitions[i])
    }

    /// Definition for a friendly name.
    #[must_use]
    pub fn by_friendly_name(&self, friendly_name: &str) -> Option<&AttributeDefinition> {
        self.by_friendly_name
            .get(friendly_name)
            .map(|&i| &self.definitions[i])
    }

    /// Looks a definition up by name URI, then by friendly name.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&AttributeDefinition> {
        self.get(name).or_else(|| self.by_friendly_name(name))
    }

    /// All definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &AttributeDefinition> {
        self.definitions.iter()
    }

    /// Required definitions for a person type.
    pub fn mandatory(&self, person_type: PersonType) -> impl Iterator<Item = &AttributeDefinition> {
        self.definitions
            .iter()
            .filter(move |d| d.required && d.person_type == person_type)
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

static EIDAS_REGISTRY: LazyLock<AttributeRegistry> = LazyLock::new(|| {
    use AttributeValueType::{Base64, Date, Gender, String as Text};
    use PersonType::{
        LegalPerson, NaturalPerson, RepresentativeLegalPerson, RepresentativeNaturalPerson,
    };

    let def = AttributeDefinition::new;
    AttributeRegistry::new(vec![
        def(uris::PERSON_IDENTIFIER, "PersonIdentifier", NaturalPerson, Text)
            .required()
            .unique_identifier(),
        def(uris::CURRENT_FAMILY_NAME, "FamilyName", NaturalPerson, Text)
            .required()
            .transliteration_mandatory(),
        def(uris::CURRENT_GIVEN_NAME, "FirstName", NaturalPerson, Text)
            .required()
            .transliteration_mandatory(),
        def(uris::DATE_OF_BIRTH, "DateOfBirth", NaturalPerson, Date).required(),
        def(uris::BIRTH_NAME, "BirthName", NaturalPerson, Text).transliteration_mandatory(),
        def(uris::PLACE_OF_BIRTH, "PlaceOfBirth", NaturalPerson, Text),
        def(uris::CURRENT_ADDRESS, "CurrentAddress", NaturalPerson, Base64),
        def(uris::GENDER, "Gender", NaturalPerson, Gender),
        def(uris::LEGAL_PERSON_IDENTIFIER, "LegalPersonIdentifier", LegalPerson, Text)
            .required()
            .unique_identifier(),
        def(uris::LEGAL_NAME, "LegalName", LegalPerson, Text)
            .required()
            .transliteration_mandatory(),
        def(uris::LEGAL_ADDRESS, "LegalAddress", LegalPerson, Base64),
        def(uris::VAT_REGISTRATION, "VATRegistration", LegalPerson, Text),
        def(uris::TAX_REFERENCE, "TaxReference", LegalPerson, Text),
        def(uris::EU_IDENTIFIER, "D-2012-17-EUIdentifier", LegalPerson, Text),
        def(uris::LEI, "LEI", LegalPerson, Text),
        def(uris::EORI, "EORI", LegalPerson, Text),
        def(uris::SEED, "SEED", LegalPerson, Text),
        def(uris::SIC, "SIC", LegalPerson, Text),
        def(
            uris::REPRESENTATIVE_PERSON_IDENTIFIER,
            "RepresentativePersonIdentifier",
            RepresentativeNaturalPerson,
            Text,
        )
        .required()
        .unique_identifier(),
        def(
            uris::REPRESENTATIVE_FAMILY_NAME,
            "RepresentativeFamilyName",
            RepresentativeNaturalPerson,
            Text,
        )
        .required()
        .transliteration_mandatory(),
        def(
            uris::REPRESENTATIVE_GIVEN_NAME,
            "RepresentativeFirstName",
            RepresentativeNaturalPerson,
            Text,
        )
        .required()
        .transliteration_mandatory(),
        def(
            uris::REPRESENTATIVE_DATE_OF_BIRTH,
            "RepresentativeDateOfBirth",
            RepresentativeNaturalPerson,
            Date,
        )
        .required(),
        def(
            uris::REPRESENTATIVE_LEGAL_PERSON_IDENTIFIER,
            "RepresentativeLegalPersonIdentifier",
            RepresentativeLegalPerson,
            Text,
        )
        .required()
        .unique_identifier(),
        def(
            uris::REPRESENTATIVE_LEGAL_NAME,
            "RepresentativeLegalName",
            RepresentativeLegalPerson,
            Text,
        )
        .required()
        .transliteration_mandatory(),
    ])
});

/// The standard eIDAS natural, legal and representative definitions.
#[must_use]
pub fn eidas_registry() -> &'static AttributeRegistry {
    &EIDAS_REGISTRY
}
