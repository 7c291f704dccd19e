//! Ordered element catalog
//!
//! Descriptor element tokens refer to kinds by 1-based position in this list.
//! The order is part of the file format and must never change.

use serde::{Deserialize, Serialize};

macro_rules! element_catalog {
    ($($kind:ident),+ $(,)?) => {
        /// Every element kind a descriptor may place
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum ElementKind {
            $($kind),+
        }

        impl ElementKind {
            /// All kinds in catalog order
            pub const ALL: &'static [ElementKind] = &[$(ElementKind::$kind),+];

            pub fn name(self) -> &'static str {
                match self {
                    $(ElementKind::$kind => stringify!($kind)),+
                }
            }
        }
    };
}

element_catalog![
    AirMattress,
    Aldan,
    Armep,
    Attack1,
    Attack2,
    Attack3,
    Attack4,
    Ball,
    BallReceptor,
    Bardin,
    Bell,
    BoardItem,
    Bombark,
    Bombie,
    Boulder,
    Box,
    Branch,
    Butterflep,
    Cannon,
    Chamal,
    Chrazer,
    Crack,
    Crusher,
    Door,
    Dynamike,
    Ekips,
    Electong,
    Elevator,
    Faller,
    FallingWall,
    FireRock,
    FixedSpikes,
    Flep,
    ForceField,
    Forsby,
    FragileFloor,
    Frock,
    Fureel,
    Gargoil,
    Gars,
    Globb,
    Goal,
    Graphic,
    GunPowder,
    Hammer,
    Heart,
    HeatBomb,
    Herb,
    Hooman,
    Hourglass,
    Icel,
    IcyFloor,
    Ignel,
    Jellep,
    JillisStone,
    Key,
    Kraklet,
    Lambul,
    Life,
    Lift,
    Luminark,
    Mantul,
    Masstalactite,
    Monep,
    MountainBombie,
    MovingWall,
    Necrul,
    Nest,
    Owlep,
    Pantan,
    Pikey,
    Pin,
    Poison,
    PoisonGas,
    Puzzle,
    PuzzlePiece,
    Quartin,
    Robort,
    Rock,
    Sahiss,
    SaveBombie,
    Shep,
    Shield,
    SideSpring,
    Snep,
    Spec,
    SpecGate,
    Spikes,
    Spring,
    Sprinny,
    Stalactite,
    StalactiteGenerator,
    Star,
    StickyFloor,
    Stilty,
    ThornyPlant,
    Turner,
    TwinWalls,
    Ulor,
    Umbrex,
    Vamdark,
    Vamep,
    Vortex,
    WallButton,
    Warclops,
    Water,
    Wheeliam,
    WindMachine,
    Xylophob,
    Yaw,
    Zep,
    Zingz,
    Zirkn,
];

impl ElementKind {
    /// Resolve a 1-based descriptor index
    pub fn from_index(index: i64) -> Option<Self> {
        let slot = usize::try_from(index).ok()?.checked_sub(1)?;
        Self::ALL.get(slot).copied()
    }

    /// 1-based descriptor index of this kind
    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|&k| k == self)
            .map_or(0, |p| p + 1)
    }

    /// Switch-capable kinds keep a persistent Normal/Taken/Used state
    /// across reloads and are registered in the stage's switch table.
    pub fn is_switch(self) -> bool {
        use ElementKind::*;
        matches!(
            self,
            Attack1
                | Attack2
                | Attack3
                | Attack4
                | Ball
                | BallReceptor
                | BoardItem
                | Heart
                | Herb
                | Hourglass
                | JillisStone
                | Key
                | Life
                | PuzzlePiece
                | SaveBombie
                | Shield
                | Spec
                | Star
        )
    }
}
