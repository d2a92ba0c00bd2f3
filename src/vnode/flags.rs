//! VNode kind flags.

bitflags::bitflags! {
    /// What a virtual node describes, as a bitfield for cheap kind checks.
    ///
    /// Exactly one of the concrete kind bits is set on any node. The
    /// `COMPONENT` and `HOST` masks group related kinds.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VNodeFlags: u8 {
        const ELEMENT = 1 << 0;
        const TEXT = 1 << 1;
        const VOID = 1 << 2;
        const COMPONENT_CLASS = 1 << 3;
        const COMPONENT_FUNCTION = 1 << 4;

        const COMPONENT = Self::COMPONENT_CLASS.bits() | Self::COMPONENT_FUNCTION.bits();
        const HOST = Self::ELEMENT.bits() | Self::TEXT.bits() | Self::VOID.bits();
    }
}

/// Coarse node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VNodeKind {
    Element,
    Component,
    Text,
    /// Empty slot. Mounted as a placeholder so positions stay stable.
    Null,
}

impl VNodeFlags {
    pub fn kind(self) -> VNodeKind {
        if self.contains(VNodeFlags::ELEMENT) {
            VNodeKind::Element
        } else if self.intersects(VNodeFlags::COMPONENT) {
            VNodeKind::Component
        } else if self.contains(VNodeFlags::TEXT) {
            VNodeKind::Text
        } else {
            VNodeKind::Null
        }
    }

    pub fn is_component(self) -> bool {
        self.intersects(VNodeFlags::COMPONENT)
    }

    pub fn is_host(self) -> bool {
        self.intersects(VNodeFlags::HOST)
    }
}
