#![allow(dead_code)]

use keyed_pool::{Error, PoolHost, Template};
use parking_lot::Mutex;
use std::{
    hash::{Hash, Hasher},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A template that can be unloaded after instances were created from it.
#[derive(Clone, Debug)]
pub struct Prefab {
    pub id: u32,
    unloaded: Arc<AtomicBool>,
}

impl Prefab {
    pub fn new(id: u32) -> Self {
        Prefab {
            id,
            unloaded: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn unload(&self) {
        self.unloaded.store(true, Ordering::SeqCst);
    }
}

impl PartialEq for Prefab {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Prefab {}

impl Hash for Prefab {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Template for Prefab {
    fn is_null(&self) -> bool {
        self.unloaded.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct Sprite {
    pub serial: usize,
    pub prefab: u32,
    pub active: AtomicBool,
    held: AtomicBool,
}

impl Sprite {
    pub fn loose(serial: usize) -> Self {
        Sprite {
            serial,
            prefab: 0,
            active: AtomicBool::new(true),
            held: AtomicBool::new(true),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct Shelf {
    pub label: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Call {
    Construct(u32),
    Held(usize),
    Available(usize),
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum HostError {
    #[error(transparent)]
    Pool(#[from] Error),
    #[error("prefab {0} failed to load")]
    Construct(u32),
}

/// Host that records every call the pool makes and refuses to hand the same
/// sprite to two holders.
#[derive(Debug, Default)]
pub struct RecordingHost {
    next_serial: AtomicUsize,
    calls: Mutex<Vec<Call>>,
    broken_prefab: Option<u32>,
}

impl RecordingHost {
    pub fn failing_on(prefab: u32) -> Self {
        RecordingHost {
            broken_prefab: Some(prefab),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn constructed(&self) -> usize {
        self.next_serial.load(Ordering::SeqCst)
    }
}

impl PoolHost<Prefab> for RecordingHost {
    type Object = Sprite;
    type HoldingArea = Shelf;
    type Error = HostError;

    fn construct(&self, template: &Prefab, _holding_area: &Shelf) -> Result<Sprite, HostError> {
        if self.broken_prefab == Some(template.id) {
            return Err(HostError::Construct(template.id));
        }
        let serial = self.next_serial.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(Call::Construct(template.id));
        Ok(Sprite {
            serial,
            prefab: template.id,
            active: AtomicBool::new(false),
            held: AtomicBool::new(false),
        })
    }

    fn set_held(&self, obj: &Sprite) {
        assert!(
            !obj.held.swap(true, Ordering::SeqCst),
            "sprite {} handed out twice",
            obj.serial
        );
        obj.active.store(true, Ordering::SeqCst);
        self.calls.lock().push(Call::Held(obj.serial));
    }

    fn set_available(&self, obj: &Sprite, _holding_area: &Shelf) {
        obj.held.store(false, Ordering::SeqCst);
        obj.active.store(false, Ordering::SeqCst);
        self.calls.lock().push(Call::Available(obj.serial));
    }
}
