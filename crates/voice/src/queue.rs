//! Strikte FIFO-Warteschlange fuer ausstehende Wiedergaben
//!
//! Unbegrenzt; jedes `sprechen` ruft zuerst den Provider auf und reiht erst
//! danach ein, das Wachstum folgt also der Nachrichtenrate.

use std::collections::VecDeque;

/// FIFO ohne Prioritaeten und ohne gezieltes Entfernen
#[derive(Debug)]
pub struct WiedergabeQueue<T> {
    eintraege: VecDeque<T>,
}

impl<T> Default for WiedergabeQueue<T> {
    fn default() -> Self {
        Self {
            eintraege: VecDeque::new(),
        }
    }
}

impl<T> WiedergabeQueue<T> {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Haengt hinten an
    pub fn einreihen(&mut self, eintrag: T) {
        self.eintraege.push_back(eintrag);
    }

    /// Entfernt den aeltesten Eintrag; `None` wenn leer
    pub fn entnehmen(&mut self) -> Option<T> {
        self.eintraege.pop_front()
    }

    pub fn len(&self) -> usize {
        self.eintraege.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eintraege.is_empty()
    }
}
