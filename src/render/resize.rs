use tokio::sync::watch;

/// Broadcasts terminal size changes to whoever is listening
pub struct ResizeHub {
    tx: watch::Sender<(u16, u16)>,
}

impl ResizeHub {
    pub fn new(size: (u16, u16)) -> Self {
        let (tx, _) = watch::channel(size);
        Self { tx }
    }

    pub fn notify(&self, width: u16, height: u16) {
        self.tx.send_replace((width, height));
    }

    pub fn size(&self) -> (u16, u16) {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> ResizeSubscription {
        ResizeSubscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Number of live subscriptions
    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A registered resize listener; dropping it unregisters
pub struct ResizeSubscription {
    rx: watch::Receiver<(u16, u16)>,
}

impl ResizeSubscription {
    /// The new size if it changed since the last call
    pub fn take_change(&mut self) -> Option<(u16, u16)> {
        if self.rx.has_changed().unwrap_or(false) {
            Some(*self.rx.borrow_and_update())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_sees_only_new_sizes() {
        let hub = ResizeHub::new((80, 24));
        let mut sub = hub.subscribe();
        assert_eq!(sub.take_change(), None);

        hub.notify(120, 40);
        assert_eq!(sub.take_change(), Some((120, 40)));
        assert_eq!(sub.take_change(), None);
        assert_eq!(hub.size(), (120, 40));
    }

    #[test]
    fn dropping_subscription_unregisters() {
        let hub = ResizeHub::new((80, 24));
        let sub = hub.subscribe();
        assert_eq!(hub.listener_count(), 1);
        drop(sub);
        assert_eq!(hub.listener_count(), 0);
    }
}
