//! Card board: one UI card per device, kept in sync with the registry.

use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::{Mutex, MutexGuard, PoisonError};

use homemirror_domain::color::Rgb;
use homemirror_domain::device::{Device, DeviceKind};
use homemirror_domain::error::SubscriberError;
use homemirror_domain::event::MirrorEvent;
use homemirror_domain::id::DeviceId;

use crate::ports::Subscriber;

/// Display model of a single device card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: DeviceId,
    pub title: String,
    pub kind_label: &'static str,
    pub room: String,
    pub on: bool,
    pub value_label: String,
    /// Slider range, for kinds that expose an adjustable level.
    pub slider: Option<RangeInclusive<u32>>,
    /// Icon tint of a lit light carrying a parsable color.
    pub accent: Option<Rgb>,
}

impl Card {
    /// Render a card from a device record.
    #[must_use]
    pub fn from_device(device: &Device) -> Self {
        let kind_label = match device.kind {
            DeviceKind::Light => "Light",
            DeviceKind::Thermostat => "Thermostat",
            DeviceKind::Door => "Door",
            DeviceKind::Camera => "Camera",
            DeviceKind::Sensor => "Sensor",
            DeviceKind::Other => "Device",
        };
        let value_label = match device.kind {
            DeviceKind::Thermostat => format!("{}°C", device.value),
            DeviceKind::Light => format!("{}%", device.value),
            _ => device.value.to_string(),
        };
        let slider = match device.kind {
            DeviceKind::Thermostat => Some(16..=30),
            DeviceKind::Light => Some(0..=100),
            _ => None,
        };
        let accent = (device.kind == DeviceKind::Light && device.status)
            .then(|| Rgb::parse_hex(&device.color))
            .flatten();
        Self {
            id: device.id.clone(),
            title: device.name.clone(),
            kind_label,
            room: device.room.clone(),
            on: device.status,
            value_label,
            slider,
            accent,
        }
    }

    /// Label of the card's status badge.
    #[must_use]
    pub fn status_label(&self) -> &'static str {
        if self.on { "ON" } else { "OFF" }
    }
}

#[derive(Debug, Default)]
struct State {
    cards: Vec<Card>,
    by_id: HashMap<DeviceId, usize>,
}

impl State {
    fn upsert(&mut self, device: &Device) {
        let card = Card::from_device(device);
        match self.by_id.get(&device.id) {
            Some(&idx) => self.cards[idx] = card,
            None => {
                self.by_id.insert(device.id.clone(), self.cards.len());
                self.cards.push(card);
            }
        }
    }
}

/// Subscriber maintaining one [`Card`] per device.
///
/// Cards are rebuilt from scratch on every load; an update refreshes the
/// matching card or appends a new one.
#[derive(Debug, Default)]
pub struct CardBoard {
    state: Mutex<State>,
}

impl CardBoard {
    /// Create an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All cards, in creation order.
    #[must_use]
    pub fn cards(&self) -> Vec<Card> {
        self.lock().cards.clone()
    }

    /// The card for `id`, if any.
    #[must_use]
    pub fn card(&self, id: &DeviceId) -> Option<Card> {
        let state = self.lock();
        state.by_id.get(id).map(|&idx| state.cards[idx].clone())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Subscriber for CardBoard {
    fn name(&self) -> &str {
        "card_board"
    }

    fn on_event(&self, event: &MirrorEvent) -> Result<(), SubscriberError> {
        let mut state = self.lock();
        match event {
            MirrorEvent::DevicesLoaded { devices, .. } => {
                *state = State::default();
                for device in devices {
                    state.upsert(device);
                }
            }
            MirrorEvent::DeviceUpdated { device, .. } => state.upsert(device),
        }
        Ok(())
    }
}
