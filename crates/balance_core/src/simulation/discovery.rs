//! Illustrative table list.
//!
//! Real discovery scans `data/tables/` on disk; that lives outside this
//! crate. This fixed set covers every playbook with a mix of pass, run and
//! perimeter cards.

use crate::analysis::TableInfo;

const TABLES: [(&str, &str, &str); 20] = [
    ("West Coast", "QUICK_PASS", "COVER_2"),
    ("West Coast", "SCREEN_PASS", "SLOT_BLITZ"),
    ("West Coast", "INSIDE_RUN", "BASE_4_3"),
    ("West Coast", "PLAY_ACTION_PASS", "COVER_3"),
    ("Spread", "BUBBLE_SCREEN", "COVER_1"),
    ("Spread", "FOUR_VERTS", "COVER_4"),
    ("Spread", "JET_SWEEP", "NICKEL_BLITZ"),
    ("Spread", "ZONE_READ", "BASE_NICKEL"),
    ("Air Raid", "FOUR_VERTS", "COVER_2"),
    ("Air Raid", "MESH_PASS", "COVER_3"),
    ("Air Raid", "Y_CROSS_PASS", "ZERO_BLITZ"),
    ("Air Raid", "DRAW_RUN", "DIME"),
    ("Smashmouth", "POWER_RUN", "BASE_4_3"),
    ("Smashmouth", "COUNTER_RUN", "GOAL_LINE"),
    ("Smashmouth", "ISO_RUN", "RUN_BLITZ"),
    ("Smashmouth", "PLAY_ACTION_PASS", "COVER_3"),
    ("Wide Zone", "OUTSIDE_ZONE", "COVER_2"),
    ("Wide Zone", "INSIDE_ZONE", "BASE_3_4"),
    ("Wide Zone", "BOOTLEG_PASS", "COVER_1"),
    ("Wide Zone", "STRETCH_TOSS", "EDGE_BLITZ"),
];

pub fn discover_tables() -> Vec<TableInfo> {
    TABLES
        .iter()
        .map(|&(playbook, offense, defense)| TableInfo::new(playbook, offense, defense))
        .collect()
}
