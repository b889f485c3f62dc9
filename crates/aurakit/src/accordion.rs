use strum::{Display as StrumDisplay, EnumIter, EnumString};

/// Sections of the members hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, StrumDisplay)]
#[strum(ascii_case_insensitive)]
pub enum Section {
    #[strum(to_string = "Geometría", serialize = "geometry", serialize = "geo")]
    Geometry,
    #[strum(to_string = "Frecuencias", serialize = "frequencies", serialize = "frec")]
    Frequencies,
    #[strum(to_string = "Comandos", serialize = "commands", serialize = "cmd")]
    Commands,
    #[strum(to_string = "Cristales", serialize = "crystals", serialize = "crist")]
    Crystals,
}

impl Section {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Geometry => "Imágenes (Geometría Sagrada)",
            Self::Frequencies => "Frecuencias",
            Self::Commands => "Comandos",
            Self::Crystals => "Cristales",
        }
    }
}

/// At most one key open at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusiveOpen<K> {
    open: Option<K>,
}

impl<K> Default for ExclusiveOpen<K> {
    fn default() -> Self {
        Self { open: None }
    }
}

impl<K: PartialEq + Copy> ExclusiveOpen<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens `key` and closes the rest, or closes `key` if it was open.
    pub fn toggle(&mut self, key: K) -> Option<K> {
        self.open = if self.open == Some(key) { None } else { Some(key) };
        self.open
    }

    pub fn open(&mut self, key: K) {
        self.open = Some(key);
    }

    pub fn close(&mut self) {
        self.open = None;
    }

    pub fn is_open(&self, key: K) -> bool {
        self.open == Some(key)
    }

    pub fn current(&self) -> Option<K> {
        self.open
    }
}

pub type AccordionHub = ExclusiveOpen<Section>;

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_toggle_is_exclusive() {
        let mut hub = AccordionHub::new();
        assert_eq!(hub.toggle(Section::Geometry), Some(Section::Geometry));
        assert_eq!(hub.toggle(Section::Commands), Some(Section::Commands));
        assert!(!hub.is_open(Section::Geometry));
        assert_eq!(hub.toggle(Section::Commands), None);
        assert!(Section::iter().all(|s| !hub.is_open(s)));
    }

    #[test]
    fn test_quick_action_forces_open() {
        let mut hub = AccordionHub::new();
        hub.open(Section::Crystals);
        hub.open(Section::Crystals);
        assert_eq!(hub.current(), Some(Section::Crystals));
        hub.close();
        assert_eq!(hub.current(), None);
    }

    #[test]
    fn test_section_names() {
        assert_eq!("frec".parse::<Section>().unwrap(), Section::Frequencies);
        assert_eq!("CRYSTALS".parse::<Section>().unwrap(), Section::Crystals);
        assert_eq!(Section::Geometry.to_string(), "Geometría");
    }

    #[test]
    fn test_item_level_keys() {
        let mut items: ExclusiveOpen<u32> = ExclusiveOpen::new();
        items.toggle(396);
        items.toggle(528);
        assert!(items.is_open(528) && !items.is_open(396));
    }
}
