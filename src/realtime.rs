//! Realtime Transport
//!
//! `ChangeFeed` over a browser WebSocket speaking the channel protocol.
//! One socket per subscription; releasing the subscription leaves the
//! channel, stops the heartbeat and closes the socket.

use std::rc::Rc;

use gloo_timers::callback::Interval;
use ocean_tasks_core::auth::TokenSlot;
use ocean_tasks_core::realtime::protocol::{Channel, Incoming};
use ocean_tasks_core::realtime::{ChangeFeed, ChangeFilter, EventSink, FeedEvent, FeedStatus, Subscription};
use ocean_tasks_core::{ClientConfig, TaskError, TaskResult};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket};

pub struct WebSocketFeed {
    config: Rc<ClientConfig>,
    token: TokenSlot,
}

impl WebSocketFeed {
    pub fn new(config: Rc<ClientConfig>, token: TokenSlot) -> Self {
        Self { config, token }
    }
}

struct Connection {
    ws: WebSocket,
    channel: Channel,
    token: TokenSlot,
}

impl Connection {
    fn send(&self, frame: &str) {
        if self.ws.ready_state() != WebSocket::OPEN {
            return;
        }
        if let Err(e) = self.ws.send_with_str(frame) {
            log::warn!("[realtime] send failed: {:?}", e);
        }
    }

    fn join(&self) {
        self.send(&self.channel.join_frame(self.token.get().as_deref()));
    }

    fn heartbeat(&self) {
        for frame in self.channel.tick_frames(self.token.get().as_deref()) {
            self.send(&frame);
        }
    }

    fn receive(&self, text: &str, sink: &EventSink) {
        match self.channel.decode(text) {
            Incoming::Change(event) => sink(FeedEvent::Change(event)),
            Incoming::Joined => {
                log::info!("[realtime] joined {}", self.channel.topic());
                sink(FeedEvent::Status(FeedStatus::Subscribed));
            }
            Incoming::JoinFailed(reason) => {
                log::warn!("[realtime] join rejected: {}", reason);
                sink(FeedEvent::Status(FeedStatus::Error(reason)));
            }
            Incoming::Closed(reason) => {
                log::warn!("[realtime] {}", reason);
                sink(FeedEvent::Status(FeedStatus::Closed));
            }
            Incoming::Ignored => {}
        }
    }

    fn close(&self) {
        self.send(&self.channel.leave_frame());
        self.ws.set_onopen(None);
        self.ws.set_onmessage(None);
        self.ws.set_onerror(None);
        self.ws.set_onclose(None);
        if let Err(e) = self.ws.close() {
            log::warn!("[realtime] close failed: {:?}", e);
        }
    }
}

/// JS callbacks registered on the socket, owned by the subscription
struct Handlers {
    _onopen: Closure<dyn FnMut(Event)>,
    _onmessage: Closure<dyn FnMut(MessageEvent)>,
    _onerror: Closure<dyn FnMut(Event)>,
    _onclose: Closure<dyn FnMut(CloseEvent)>,
    heartbeat: Interval,
}

impl ChangeFeed for WebSocketFeed {
    fn subscribe(&self, filter: ChangeFilter, sink: EventSink) -> TaskResult<Subscription> {
        let ws = WebSocket::new(&self.config.realtime_url())
            .map_err(|e| TaskError::remote(format!("could not open realtime socket: {:?}", e)))?;
        let conn = Rc::new(Connection {
            ws,
            channel: Channel::new(&self.config.channel, filter),
            token: self.token.clone(),
        });

        let onopen = {
            let conn = conn.clone();
            Closure::<dyn FnMut(Event)>::new(move |_: Event| conn.join())
        };
        let onmessage = {
            let conn = conn.clone();
            let sink = sink.clone();
            Closure::<dyn FnMut(MessageEvent)>::new(move |e: MessageEvent| {
                if let Some(text) = e.data().as_string() {
                    conn.receive(&text, &sink);
                }
            })
        };
        let onerror = {
            let sink = sink.clone();
            Closure::<dyn FnMut(Event)>::new(move |_: Event| {
                log::warn!("[realtime] socket error");
                sink(FeedEvent::Status(FeedStatus::Error("Live updates are unavailable.".to_string())));
            })
        };
        let onclose = Closure::<dyn FnMut(CloseEvent)>::new(move |e: CloseEvent| {
            log::info!("[realtime] socket closed ({})", e.code());
            sink(FeedEvent::Status(FeedStatus::Closed));
        });

        conn.ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));
        conn.ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        conn.ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        conn.ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));

        let heartbeat = {
            let conn = conn.clone();
            Interval::new(self.config.heartbeat_interval_ms, move || conn.heartbeat())
        };
        let handlers = Handlers {
            _onopen: onopen,
            _onmessage: onmessage,
            _onerror: onerror,
            _onclose: onclose,
            heartbeat,
        };

        Ok(Subscription::holding(handlers, move |handlers: Handlers| {
            handlers.heartbeat.cancel();
            conn.close();
            log::info!("[realtime] left {}", conn.channel.topic());
        }))
    }
}
