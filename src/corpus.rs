//! Static content corpus.
//!
//! The corpus is built once from `'static` tables and shared by reference;
//! nothing here can be mutated at runtime.

use serde::Serialize;

use crate::schedule::{AzkarPeriod, TimeSlot};

/// Slot an entry is preferred for; `Any` makes it eligible in every slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferredSlot {
    Friday,
    Morning,
    Afternoon,
    Evening,
    Night,
    Any,
}

impl PreferredSlot {
    /// Exact match on the slot (does not treat `Any` as a wildcard).
    pub fn is(&self, slot: TimeSlot) -> bool {
        *self == PreferredSlot::from(slot)
    }

    /// Whether an entry with this preference is eligible during `slot`.
    pub fn matches(&self, slot: TimeSlot) -> bool {
        *self == PreferredSlot::Any || self.is(slot)
    }
}

impl From<TimeSlot> for PreferredSlot {
    fn from(slot: TimeSlot) -> Self {
        match slot {
            TimeSlot::Friday => PreferredSlot::Friday,
            TimeSlot::Morning => PreferredSlot::Morning,
            TimeSlot::Afternoon => PreferredSlot::Afternoon,
            TimeSlot::Evening => PreferredSlot::Evening,
            TimeSlot::Night => PreferredSlot::Night,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ZikrEntry {
    pub arabic: &'static str,
    pub transliteration: &'static str,
    pub translation: &'static str,
    pub preferred_slot: PreferredSlot,
}

/// Entry of the themed morning/evening list, tracked by `id` once read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SupplementaryZikr {
    pub id: &'static str,
    pub arabic: &'static str,
    pub transliteration: &'static str,
    pub translation: &'static str,
    pub period: AzkarPeriod,
}

/// Index of an entry inside the corpus it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntryId(pub usize);

/// Non-empty, ordered, read-only collection of entries.
#[derive(Debug, Clone, Copy)]
pub struct Corpus {
    entries: &'static [ZikrEntry],
}

impl Corpus {
    /// Returns `None` for an empty table; every other operation relies on
    /// the corpus holding at least one entry.
    pub fn new(entries: &'static [ZikrEntry]) -> Option<Self> {
        if entries.is_empty() {
            None
        } else {
            Some(Self { entries })
        }
    }

    /// The built-in corpus.
    pub fn standard() -> Self {
        Self { entries: AZKAR }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: EntryId) -> Option<&'static ZikrEntry> {
        self.entries.get(id.0)
    }

    /// Entry for an id produced by this corpus.
    pub fn entry(&self, id: EntryId) -> &'static ZikrEntry {
        &self.entries[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &'static ZikrEntry)> {
        self.entries.iter().enumerate().map(|(i, e)| (EntryId(i), e))
    }

    /// First entry satisfying `predicate`, in corpus order.
    pub fn position(&self, predicate: impl Fn(&ZikrEntry) -> bool) -> Option<EntryId> {
        self.entries.iter().position(predicate).map(EntryId)
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Self::standard()
    }
}

/// Supplementary entries for one period, in table order.
pub fn supplementary_for(period: AzkarPeriod) -> impl Iterator<Item = &'static SupplementaryZikr> {
    MORNING_EVENING_AZKAR.iter().filter(move |z| z.period == period)
}

pub static AZKAR: &[ZikrEntry] = &[
    ZikrEntry {
        arabic: "سُبْحَانَ اللَّهِ وَبِحَمْدِهِ",
        transliteration: "Subhan Allahi wa bihamdihi",
        translation: "Glory be to Allah and praise Him",
        preferred_slot: PreferredSlot::Morning,
    },
    ZikrEntry {
        arabic: "لَا إِلَٰهَ إِلَّا اللَّهُ وَحْدَهُ لَا شَرِيكَ لَهُ",
        transliteration: "La ilaha illa Allah wahdahu la sharika lah",
        translation: "There is no deity except Allah, alone without partner",
        preferred_slot: PreferredSlot::Any,
    },
    ZikrEntry {
        arabic: "اللَّهُمَّ صَلِّ عَلَى مُحَمَّدٍ وَعَلَى آلِ مُحَمَّدٍ",
        transliteration: "Allahumma salli ala Muhammad wa ala ali Muhammad",
        translation: "O Allah, send blessings upon Muhammad and his family",
        preferred_slot: PreferredSlot::Friday,
    },
    ZikrEntry {
        arabic: "أَسْتَغْفِرُ اللَّهَ وَأَتُوبُ إِلَيْهِ",
        transliteration: "Astaghfirullah wa atubu ilayh",
        translation: "I seek forgiveness from Allah and repent to Him",
        preferred_slot: PreferredSlot::Night,
    },
    ZikrEntry {
        arabic: "سُبْحَانَ اللَّهِ وَالْحَمْدُ لِلَّهِ وَلَا إِلَٰهَ إِلَّا اللَّهُ وَاللَّهُ أَكْبَرُ",
        transliteration: "Subhan Allah wal hamdu lillah wa la ilaha illa Allah wa Allahu Akbar",
        translation: "Glory be to Allah, praise be to Allah, there is no deity except Allah, and Allah is the Greatest",
        preferred_slot: PreferredSlot::Morning,
    },
    ZikrEntry {
        arabic: "لَا حَوْلَ وَلَا قُوَّةَ إِلَّا بِاللَّهِ",
        transliteration: "La hawla wa la quwwata illa billah",
        translation: "There is no power nor strength except with Allah",
        preferred_slot: PreferredSlot::Any,
    },
    ZikrEntry {
        arabic: "حَسْبُنَا اللَّهُ وَنِعْمَ الْوَكِيلُ",
        transliteration: "Hasbunallahu wa ni'mal wakeel",
        translation: "Allah is sufficient for us, and He is the best Disposer of affairs",
        preferred_slot: PreferredSlot::Afternoon,
    },
    ZikrEntry {
        arabic: "رَبِّ اغْفِرْ لِي وَارْحَمْنِي",
        transliteration: "Rabbi ghfir li war hamni",
        translation: "My Lord, forgive me and have mercy upon me",
        preferred_slot: PreferredSlot::Night,
    },
    ZikrEntry {
        arabic: "اللَّهُمَّ بَارِكْ لَنَا فِي يَوْمِنَا هَذَا",
        transliteration: "Allahumma barik lana fi yawmina hadha",
        translation: "O Allah, bless us on this day",
        preferred_slot: PreferredSlot::Friday,
    },
    ZikrEntry {
        arabic: "رَبَّنَا آتِنَا فِي الدُّنْيَا حَسَنَةً وَفِي الْآخِرَةِ حَسَنَةً وَقِنَا عَذَابَ النَّارِ",
        transliteration: "Rabbana atina fi dunya hasanatan wa fi akhirati hasanatan wa qina adhaban nar",
        translation: "Our Lord, give us good in this world and good in the Hereafter, and save us from the punishment of the Fire",
        preferred_slot: PreferredSlot::Evening,
    },
];

pub static MORNING_EVENING_AZKAR: &[SupplementaryZikr] = &[
    SupplementaryZikr {
        id: "morning-1",
        arabic: "أَصْبَحْنَا وَأَصْبَحَ الْمُلْكُ لِلَّهِ",
        transliteration: "Asbahna wa asbahal mulku lillah",
        translation: "We have reached the morning and at this very time all sovereignty belongs to Allah",
        period: AzkarPeriod::Morning,
    },
    SupplementaryZikr {
        id: "morning-2",
        arabic: "اللَّهُمَّ بِكَ أَصْبَحْنَا وَبِكَ أَمْسَيْنَا",
        transliteration: "Allahumma bika asbahna wa bika amsayna",
        translation: "O Allah, by You we enter the morning and by You we enter the evening",
        period: AzkarPeriod::Morning,
    },
    SupplementaryZikr {
        id: "evening-1",
        arabic: "أَمْسَيْنَا وَأَمْسَى الْمُلْكُ لِلَّهِ",
        transliteration: "Amsayna wa amsal mulku lillah",
        translation: "We have reached the evening and at this very time all sovereignty belongs to Allah",
        period: AzkarPeriod::Evening,
    },
    SupplementaryZikr {
        id: "evening-2",
        arabic: "اللَّهُمَّ بِكَ أَمْسَيْنَا وَبِكَ أَصْبَحْنَا",
        transliteration: "Allahumma bika amsayna wa bika asbahna",
        translation: "O Allah, by You we enter the evening and by You we enter the morning",
        period: AzkarPeriod::Evening,
    },
];
