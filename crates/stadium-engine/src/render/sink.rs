use super::DrawCommand;

/// Consumer of the per-frame command stream (a device context, a recorder...).
pub trait CommandSink {
    fn submit(&mut self, cmd: DrawCommand);
}

/// Records commands in submission order.
///
/// Capacity is kept across `clear()` so a warmed-up recorder does not
/// allocate per frame.
#[derive(Debug, Default)]
pub struct RecordingSink {
    commands: Vec<DrawCommand>,
}

impl RecordingSink {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    #[inline]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn draw_count(&self) -> usize {
        self.commands.iter().filter(|c| c.is_draw()).count()
    }
}

impl CommandSink for RecordingSink {
    #[inline]
    fn submit(&mut self, cmd: DrawCommand) {
        self.commands.push(cmd);
    }
}
