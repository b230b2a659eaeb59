use crate::{input::events::MapEvent, prelude::HashMap};
use std::collections::VecDeque;

type EventCallback = Box<dyn Fn(&MapEvent)>;

/// Queues map events and fans them out to listeners when processed
#[derive(Default)]
pub struct EventManager {
    /// Event listeners by event kind
    listeners: HashMap<String, Vec<EventCallback>>,
    /// Event queue for processing
    event_queue: VecDeque<MapEvent>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event listener. `"*"` receives every event.
    pub fn on<F>(&mut self, event_type: &str, callback: F)
    where
        F: Fn(&MapEvent) + 'static,
    {
        self.listeners
            .entry(event_type.to_string())
            .or_default()
            .push(Box::new(callback));
    }

    /// Emit an event to the queue
    pub fn emit(&mut self, event: MapEvent) {
        self.event_queue.push_back(event);
    }

    /// Process all queued events
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        let events: Vec<_> = self.event_queue.drain(..).collect();

        for event in &events {
            for key in [event.kind(), "*"] {
                if let Some(callbacks) = self.listeners.get(key) {
                    for callback in callbacks {
                        callback(event);
                    }
                }
            }
        }

        events
    }

    /// Get number of pending events
    pub fn pending_events(&self) -> usize {
        self.event_queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLng;
    use std::{cell::RefCell, rc::Rc};

    #[test]
    fn test_listeners_receive_matching_events() {
        let mut manager = EventManager::new();
        let located = Rc::new(RefCell::new(Vec::new()));
        let everything = Rc::new(RefCell::new(0));

        let sink = located.clone();
        manager.on("located", move |event| sink.borrow_mut().push(event.clone()));
        let counter = everything.clone();
        manager.on("*", move |_| *counter.borrow_mut() += 1);

        manager.emit(MapEvent::Located {
            position: LatLng::new(1.0, 2.0),
        });
        manager.emit(MapEvent::GeolocationFailed {
            code: 3,
            message: "timeout".to_string(),
        });
        assert_eq!(manager.pending_events(), 2);

        let processed = manager.process_events();
        assert_eq!(processed.len(), 2);
        assert_eq!(manager.pending_events(), 0);
        assert_eq!(located.borrow().len(), 1);
        assert_eq!(*everything.borrow(), 2);
    }
}
