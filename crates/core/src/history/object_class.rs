#![forbid(unsafe_code)]

/// Object classes the primary database stores, keyed the way the class table
/// of the genealogy engine numbers them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectClass {
    Person,
    Family,
    Source,
    Event,
    Media,
    Place,
    Repository,
    Reference,
    Note,
    Tag,
    Citation,
}

impl ObjectClass {
    pub const ALL: [ObjectClass; 11] = [
        ObjectClass::Person,
        ObjectClass::Family,
        ObjectClass::Source,
        ObjectClass::Event,
        ObjectClass::Media,
        ObjectClass::Place,
        ObjectClass::Repository,
        ObjectClass::Reference,
        ObjectClass::Note,
        ObjectClass::Tag,
        ObjectClass::Citation,
    ];

    pub fn key(self) -> u8 {
        match self {
            Self::Person => 0,
            Self::Family => 1,
            Self::Source => 2,
            Self::Event => 3,
            Self::Media => 4,
            Self::Place => 5,
            Self::Repository => 6,
            Self::Reference => 7,
            Self::Note => 8,
            Self::Tag => 9,
            Self::Citation => 10,
        }
    }

    pub fn from_key(key: u8) -> Option<Self> {
        Self::ALL.get(usize::from(key)).copied()
    }

    /// Class name as stored in the `changes.obj_class` column.
    pub fn name(self) -> &'static str {
        match self {
            Self::Person => "Person",
            Self::Family => "Family",
            Self::Source => "Source",
            Self::Event => "Event",
            Self::Media => "Media",
            Self::Place => "Place",
            Self::Repository => "Repository",
            Self::Reference => "Reference",
            Self::Note => "Note",
            Self::Tag => "Tag",
            Self::Citation => "Citation",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|class| class.name() == name)
    }

    /// Like [`ObjectClass::from_name`], also accepting a class key such as `"7"`.
    pub fn from_stored(value: &str) -> Option<Self> {
        Self::from_name(value).or_else(|| value.parse::<u8>().ok().and_then(Self::from_key))
    }

    /// Prefix of the change signals emitted for this class (`person-add`, ...).
    pub fn signal_name(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Family => "family",
            Self::Source => "source",
            Self::Event => "event",
            Self::Media => "media",
            Self::Place => "place",
            Self::Repository => "repository",
            Self::Reference => "reference",
            Self::Note => "note",
            Self::Tag => "tag",
            Self::Citation => "citation",
        }
    }

    pub fn is_reference(self) -> bool {
        matches!(self, Self::Reference)
    }
}

impl std::fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
