use anyhow::Result;
use tracing::instrument;
use xcb::{
    screensaver::{QueryInfo, QueryInfoReply, State},
    x::{Drawable, QueryPointer, Window},
    Connection,
};

use super::ActivityProbe;

pub struct X11Probe {
    connection: Connection,
    preferred_screen: i32,
}

impl X11Probe {
    pub fn new() -> Result<Self> {
        let (connection, preferred_screen) = xcb::Connection::connect(None)?;
        Ok(Self {
            connection,
            preferred_screen,
        })
    }

    fn root(&self) -> Window {
        // Currently the application only supports 1 x11 screen.
        self.connection
            .get_setup()
            .roots()
            .nth(self.preferred_screen.max(0) as usize)
            .unwrap()
            .root()
    }

    fn query_info(&self) -> Result<QueryInfoReply> {
        let cookie = self.connection.send_request(&QueryInfo {
            drawable: Drawable::Window(self.root()),
        });
        Ok(self.connection.wait_for_reply(cookie)?)
    }
}

impl ActivityProbe for X11Probe {
    #[instrument(skip(self))]
    fn idle_time(&mut self) -> Result<u32> {
        Ok(self.query_info()?.ms_since_user_input())
    }

    #[instrument(skip(self))]
    fn is_locked(&mut self) -> Result<bool> {
        Ok(self.query_info()?.state() == State::On as u8)
    }

    #[instrument(skip(self))]
    fn pointer_position(&mut self) -> Result<(i32, i32)> {
        let cookie = self.connection.send_request(&QueryPointer { window: self.root() });
        let reply = self.connection.wait_for_reply(cookie)?;
        Ok((reply.root_x() as i32, reply.root_y() as i32))
    }
}
