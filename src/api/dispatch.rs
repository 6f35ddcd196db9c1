use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use smallvec::SmallVec;
use tracing::trace;

use crate::core::{ChartData, Theme, Trade};
use crate::feed::FeedEvent;
use crate::interaction::CrosshairMove;

use super::widget::Controller;
use super::{
    ConnectionCallback, DataUpdateCallback, ErrorCallback, PriceSeriesType, TradeCallback,
    WidgetState,
};

/// Everything that can mutate a widget, from the host or a collaborator.
#[derive(Debug)]
pub(super) enum Command {
    Start,
    Feed(FeedEvent),
    Crosshair(CrosshairMove),
    LoadToken(String),
    PollSubscription { generation: u64, elapsed: Duration },
    Resize {
        width: Option<u32>,
        height: Option<u32>,
    },
    SetShowVolume(bool),
    SetPriceSeriesType(PriceSeriesType),
    SetTheme(Theme),
    Destroy,
}

/// Host callback invocation deferred until the controller is released.
pub(super) enum Notification {
    Error(ErrorCallback, String),
    DataUpdate(DataUpdateCallback, ChartData),
    Trade(TradeCallback, Trade),
    Connection(ConnectionCallback, bool),
}

impl Notification {
    fn deliver(self) {
        match self {
            Self::Error(callback, message) => callback(&message),
            Self::DataUpdate(callback, data) => callback(&data),
            Self::Trade(callback, trade) => callback(&trade),
            Self::Connection(callback, connected) => callback(connected),
        }
    }
}

pub(super) type Notifications = SmallVec<[Notification; 2]>;

/// Controller plus its command queue.
///
/// All mutation goes through [`Shared::dispatch`]. A command dispatched
/// while the controller is busy (a feed emitting inside `initialize`, a
/// chart firing a crosshair move) is queued and drained by the caller
/// already holding the controller, so handlers never re-enter.
pub(super) struct Shared {
    pub(super) controller: RefCell<Controller>,
    pub(super) state: Cell<WidgetState>,
    queue: RefCell<VecDeque<Command>>,
}

impl Shared {
    pub(super) fn new(controller: Controller) -> Self {
        let state = controller.state();
        Self {
            controller: RefCell::new(controller),
            state: Cell::new(state),
            queue: RefCell::new(VecDeque::new()),
        }
    }

    pub(super) fn dispatch(self: &Rc<Self>, command: Command) {
        trace!(?command, "dispatch");
        self.queue.borrow_mut().push_back(command);
        self.drain();
    }

    fn drain(self: &Rc<Self>) {
        loop {
            let notifications = {
                let Ok(mut controller) = self.controller.try_borrow_mut() else {
                    return;
                };
                let Some(command) = self.queue.borrow_mut().pop_front() else {
                    return;
                };
                let notifications = controller.handle(command, Rc::downgrade(self));
                self.state.set(controller.state());
                notifications
            };
            // Host callbacks run with the controller released so they may
            // call back into the widget.
            for notification in notifications {
                notification.deliver();
            }
        }
    }
}

/// Cloneable entry point through which collaborators report events.
///
/// Holds no strong reference: once the widget handle is gone every emit is a
/// no-op, and after `destroy` the controller drops what arrives.
#[derive(Clone)]
pub struct EventSink {
    shared: Weak<Shared>,
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("attached", &(self.shared.strong_count() > 0))
            .finish()
    }
}

impl EventSink {
    pub(super) fn new(shared: Weak<Shared>) -> Self {
        Self { shared }
    }

    /// A sink bound to no widget; every emit is dropped.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            shared: Weak::new(),
        }
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.shared.strong_count() > 0
    }

    pub fn emit(&self, event: FeedEvent) {
        self.send(Command::Feed(event));
    }

    pub fn chart_update(&self, data: ChartData) {
        self.emit(FeedEvent::ChartUpdate(data));
    }

    pub fn trade(&self, trade: Trade) {
        self.emit(FeedEvent::Trade(trade));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(FeedEvent::Error(message.into()));
    }

    pub fn connection_status(&self, connected: bool) {
        self.emit(FeedEvent::ConnectionStatus(connected));
    }

    pub(super) fn crosshair(&self, event: CrosshairMove) {
        self.send(Command::Crosshair(event));
    }

    pub(super) fn send(&self, command: Command) {
        match self.shared.upgrade() {
            Some(shared) => shared.dispatch(command),
            None => trace!(?command, "dropping event for released widget"),
        }
    }
}
