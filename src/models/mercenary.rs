use std::collections::BTreeSet;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

const PORTRAIT_BASE_URL: &str = "https://cdn.jsdelivr.net/gh/gh777kkk/gersanginfo-img@main/characters";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MercenaryClass {
    #[serde(rename = "전설장수")]
    Legendary,
    #[serde(rename = "각성장수")]
    Awakened,
    /// Upgraded siege units. Their materials are not sold on the market.
    #[serde(rename = "개조장수")]
    Modified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequirement {
    pub name: String,
    pub quantity: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildMercenary {
    pub id: u32,
    pub name: String,
    pub img_path: String,
    pub attributes_name: String,
    pub country_name: String,
    pub items: Vec<ItemRequirement>,
    pub class_type_name: MercenaryClass,
}

/// A legendary mercenary: its own recipe plus the mercenaries that must be
/// crafted first and consumed by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mercenary {
    pub id: u32,
    pub name: String,
    pub img_path: String,
    pub attributes_name: String,
    pub country_name: String,
    pub items: Vec<ItemRequirement>,
    pub class_type_name: MercenaryClass,
    pub child_mercenaries: Vec<ChildMercenary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MercenaryListItem {
    pub id: u32,
    pub name: String,
    pub img_path: String,
    pub attributes_name: String,
    pub country_name: String,
    pub child_count: usize,
}

impl From<&Mercenary> for MercenaryListItem {
    fn from(mercenary: &Mercenary) -> Self {
        Self {
            id: mercenary.id,
            name: mercenary.name.clone(),
            img_path: mercenary.img_path.clone(),
            attributes_name: mercenary.attributes_name.clone(),
            country_name: mercenary.country_name.clone(),
            child_count: mercenary.child_mercenaries.len(),
        }
    }
}

/// Material cost of one legendary mercenary at current minimum prices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CraftingCost {
    pub main_cost: u64,
    pub child_cost: u64,
    pub total_cost: u64,
    /// Required materials that had no listed price and were left out.
    pub unpriced_items: Vec<String>,
}

struct ChildEntry {
    id: u32,
    name: &'static str,
    portrait: &'static str,
    attribute: &'static str,
    country: &'static str,
    materials: &'static [(&'static str, u64)],
}

struct LegendEntry {
    id: u32,
    name: &'static str,
    portrait: &'static str,
    attribute: &'static str,
    country: &'static str,
    materials: &'static [(&'static str, u64)],
    awakened: &'static [u32],
    modified: &'static [u32],
}

const AWAKENING: &[(&str, u64)] = &[("영웅의 영혼석", 20), ("각성석", 1)];

const MODIFIED: &[ChildEntry] = &[
    ChildEntry { id: 134, name: "개량된 흑룡차", portrait: "PORTRAIT_INVEN_3_66.png", attribute: "水", country: "일본", materials: &[("변이된 용의 보주", 20)] },
    ChildEntry { id: 133, name: "개량된 지진차", portrait: "PORTRAIT_INVEN_2_293.png", attribute: "火", country: "일본", materials: &[("연발 총신", 20)] },
    ChildEntry { id: 129, name: "개량된 발석거", portrait: "PORTRAIT_INVEN_3_67.png", attribute: "水", country: "중국", materials: &[("봉인부적", 20)] },
    ChildEntry { id: 128, name: "개량된 불랑기포", portrait: "PORTRAIT_INVEN_2_295.png", attribute: "火", country: "중국", materials: &[("노획한 포탄", 20)] },
    ChildEntry { id: 124, name: "개량된 봉황비조", portrait: "PORTRAIT_INVEN_3_46.png", attribute: "火", country: "대만", materials: &[("불타는깃털", 20)] },
    ChildEntry { id: 123, name: "개량된 화룡차", portrait: "PORTRAIT_INVEN_2_294.png", attribute: "火", country: "대만", materials: &[("거대 화룡의 머리뼈", 20)] },
    ChildEntry { id: 119, name: "개량된 뇌전차", portrait: "PORTRAIT_INVEN_3_45.png", attribute: "雷", country: "조선", materials: &[("진은조각", 20)] },
    ChildEntry { id: 118, name: "개량된 거북차", portrait: "PORTRAIT_INVEN_2_292.png", attribute: "火", country: "조선", materials: &[("신기전의화살", 20)] },
];

const AWAKENED: &[ChildEntry] = &[
    ChildEntry { id: 146, name: "각성 라시야", portrait: "PORTRAIT_INVEN_3_282.png", attribute: "水", country: "인도", materials: AWAKENING },
    ChildEntry { id: 145, name: "각성 쿠베라마차", portrait: "PORTRAIT_INVEN_3_266.png", attribute: "水", country: "인도", materials: AWAKENING },
    ChildEntry { id: 144, name: "각성 하누만", portrait: "PORTRAIT_INVEN_3_264.png", attribute: "風", country: "인도", materials: AWAKENING },
    ChildEntry { id: 143, name: "각성 난다데비", portrait: "PORTRAIT_INVEN_3_252.png", attribute: "風", country: "인도", materials: AWAKENING },
    ChildEntry { id: 142, name: "각성 슈크라", portrait: "PORTRAIT_INVEN_3_224.png", attribute: "火", country: "인도", materials: AWAKENING },
    ChildEntry { id: 141, name: "각성 나라야나", portrait: "PORTRAIT_INVEN_3_192.png", attribute: "火", country: "인도", materials: AWAKENING },
    ChildEntry { id: 140, name: "각성 아르주나", portrait: "PORTRAIT_INVEN_3_174.png", attribute: "風", country: "인도", materials: AWAKENING },
    ChildEntry { id: 139, name: "각성 파쇄차", portrait: "PORTRAIT_INVEN_3_122.png", attribute: "風", country: "인도", materials: AWAKENING },
    ChildEntry { id: 138, name: "각성 구흐야카", portrait: "PORTRAIT_INVEN_3_101.png", attribute: "雷", country: "인도", materials: AWAKENING },
    ChildEntry { id: 137, name: "각성 아즈미", portrait: "PORTRAIT_INVEN_3_151.png", attribute: "雷", country: "일본", materials: AWAKENING },
    ChildEntry { id: 136, name: "각성 세쓰노카미", portrait: "PORTRAIT_INVEN_3_107.png", attribute: "火", country: "일본", materials: AWAKENING },
    ChildEntry { id: 135, name: "각성 도라노스케", portrait: "PORTRAIT_INVEN_3_74.png", attribute: "風", country: "일본", materials: AWAKENING },
    ChildEntry { id: 132, name: "각성 가네샤", portrait: "PORTRAIT_INVEN_3_165.png", attribute: "水", country: "중국", materials: AWAKENING },
    ChildEntry { id: 131, name: "각성 동방은아", portrait: "PORTRAIT_INVEN_3_93.png", attribute: "水", country: "중국", materials: AWAKENING },
    ChildEntry { id: 130, name: "각성 오행기", portrait: "PORTRAIT_INVEN_3_73.png", attribute: "火", country: "중국", materials: AWAKENING },
    ChildEntry { id: 127, name: "각성 뇌공", portrait: "PORTRAIT_INVEN_3_147.png", attribute: "雷", country: "대만", materials: AWAKENING },
    ChildEntry { id: 126, name: "각성 유민", portrait: "PORTRAIT_INVEN_3_77.png", attribute: "風", country: "대만", materials: AWAKENING },
    ChildEntry { id: 125, name: "각성 크라슈미", portrait: "PORTRAIT_INVEN_3_72.png", attribute: "風", country: "대만", materials: AWAKENING },
    ChildEntry { id: 122, name: "각성 선무공신", portrait: "PORTRAIT_INVEN_4_157.png", attribute: "火", country: "조선", materials: AWAKENING },
    ChildEntry { id: 121, name: "각성 서산대사", portrait: "PORTRAIT_INVEN_3_76.png", attribute: "雷", country: "조선", materials: AWAKENING },
    ChildEntry { id: 120, name: "각성 시호충장", portrait: "PORTRAIT_INVEN_3_71.png", attribute: "雷", country: "조선", materials: AWAKENING },
];

const LEGENDS: &[LegendEntry] = &[
    LegendEntry {
        id: 206, name: "레지나 술타나", portrait: "PORTRAIT_INVEN_4_286.png", attribute: "地", country: "인도",
        materials: &[("땅의속성석", 30), ("정기의구슬(地)", 20), ("땅의정령석", 30), ("영웅의 영혼석", 150), ("영혼이 봉인된 호리병", 4)],
        awakened: &[140, 138, 145, 142], modified: &[],
    },
    LegendEntry {
        id: 160, name: "선인 만선야", portrait: "PORTRAIT_INVEN_4_259.png", attribute: "雷", country: "대만",
        materials: &[("뇌전의속성석", 40), ("정기의구슬(雷)", 25), ("뇌전의정령석", 40), ("영웅의 영혼석", 150), ("영혼이 봉인된 호리병", 4)],
        awakened: &[127, 126, 122, 146], modified: &[],
    },
    LegendEntry {
        id: 159, name: "모치즈키 치요메", portrait: "PORTRAIT_INVEN_4_240.png", attribute: "水", country: "일본",
        materials: &[("물의속성석", 40), ("정기의구슬(水)", 25), ("물의정령석", 40), ("영웅의 영혼석", 150), ("영혼이 봉인된 호리병", 4)],
        awakened: &[131, 139, 136, 137], modified: &[],
    },
    LegendEntry {
        id: 158, name: "봉선 여포", portrait: "PORTRAIT_INVEN_4_235.png", attribute: "火", country: "중국",
        materials: &[("불의속성석", 40), ("정기의구슬(火)", 25), ("불의정령석", 40), ("영웅의 영혼석", 150), ("영혼이 봉인된 호리병", 4)],
        awakened: &[130, 132, 127, 144], modified: &[],
    },
    LegendEntry {
        id: 157, name: "도사 홍길동", portrait: "PORTRAIT_INVEN_4_176.png", attribute: "風", country: "조선",
        materials: &[("바람의속성석", 40), ("정기의구슬(風)", 25), ("바람의정령석", 40), ("영웅의 영혼석", 150), ("영혼이 봉인된 호리병", 4)],
        awakened: &[122, 140, 120], modified: &[134],
    },
    LegendEntry {
        id: 156, name: "악바르 대제", portrait: "PORTRAIT_INVEN_4_130.png", attribute: "地", country: "인도",
        materials: &[("땅의속성석", 30), ("정기의구슬(地)", 20), ("땅의정령석", 20), ("영웅의 영혼석", 150), ("영혼이 봉인된 호리병", 4)],
        awakened: &[144, 146, 142, 143], modified: &[],
    },
    LegendEntry {
        id: 155, name: "해신 마조", portrait: "PORTRAIT_INVEN_4_82.png", attribute: "水", country: "대만",
        materials: &[("물의속성석", 40), ("정기의구슬(水)", 25), ("물의정령석", 40), ("영웅의 영혼석", 150), ("영혼이 봉인된 호리병", 4)],
        awakened: &[137, 125], modified: &[123, 124],
    },
    LegendEntry {
        id: 154, name: "검성 보쿠텐", portrait: "PORTRAIT_INVEN_4_81.png", attribute: "風", country: "일본",
        materials: &[("바람의속성석", 40), ("정기의구슬(風)", 25), ("바람의정령석", 40), ("영웅의 영혼석", 150), ("영혼이 봉인된 호리병", 4)],
        awakened: &[135, 136, 126], modified: &[133],
    },
    LegendEntry {
        id: 153, name: "여걸 화목란", portrait: "PORTRAIT_INVEN_4_56.png", attribute: "雷", country: "중국",
        materials: &[("뇌전의속성석", 40), ("정기의구슬(雷)", 25), ("뇌전의정령석", 40), ("영웅의 영혼석", 150), ("영혼이 봉인된 호리병", 4)],
        awakened: &[132, 131, 120], modified: &[129],
    },
    LegendEntry {
        id: 152, name: "도령 최무선", portrait: "PORTRAIT_INVEN_4_55.png", attribute: "火", country: "조선",
        materials: &[("불의속성석", 40), ("정기의구슬(火)", 25), ("불의정령석", 40), ("영웅의 영혼석", 150), ("영혼이 봉인된 호리병", 4)],
        awakened: &[121], modified: &[128, 119, 118],
    },
    LegendEntry {
        id: 151, name: "재상 바지라오", portrait: "PORTRAIT_INVEN_4_39.png", attribute: "地", country: "인도",
        materials: &[("땅의속성석", 15), ("정기의구슬(地)", 15), ("땅의정령석", 15), ("영웅의 영혼석", 100), ("영혼이 봉인된 호리병", 4)],
        awakened: &[138, 145, 141, 139], modified: &[],
    },
    LegendEntry {
        id: 150, name: "군신 노부츠나", portrait: "PORTRAIT_INVEN_3_263.png", attribute: "火", country: "일본",
        materials: &[("불의속성석", 20), ("정기의구슬(火)", 20), ("불의정령석", 20), ("영웅의 영혼석", 100), ("영혼이 봉인된 호리병", 4)],
        awakened: &[130], modified: &[124, 119],
    },
    LegendEntry {
        id: 149, name: "야왕 맹획", portrait: "PORTRAIT_INVEN_3_251.png", attribute: "風", country: "대만",
        materials: &[("바람의속성석", 20), ("바람의정령석", 20), ("정기의구슬(風)", 20), ("영웅의 영혼석", 100), ("영혼이 봉인된 호리병", 4)],
        awakened: &[121], modified: &[134, 129],
    },
    LegendEntry {
        id: 148, name: "무희 초선", portrait: "PORTRAIT_INVEN_3_201.png", attribute: "水", country: "중국",
        materials: &[("물의속성석", 20), ("정기의구슬(水)", 20), ("물의정령석", 20), ("영웅의 영혼석", 100), ("영혼이 봉인된 호리병", 4)],
        awakened: &[125], modified: &[133, 118],
    },
    LegendEntry {
        id: 147, name: "신궁 주몽", portrait: "PORTRAIT_INVEN_3_200.png", attribute: "雷", country: "조선",
        materials: &[("뇌전의속성석", 20), ("정기의구슬(雷)", 20), ("뇌전의정령석", 20), ("영웅의 영혼석", 100), ("영혼이 봉인된 호리병", 4)],
        awakened: &[135], modified: &[128, 123],
    },
];

fn requirements(materials: &[(&str, u64)]) -> Vec<ItemRequirement> {
    materials
        .iter()
        .map(|&(name, quantity)| ItemRequirement {
            name: name.to_string(),
            quantity,
        })
        .collect()
}

fn portrait_url(file: &str) -> String {
    format!("{}/{}", PORTRAIT_BASE_URL, file)
}

fn child(entries: &[ChildEntry], id: u32, class: MercenaryClass) -> Option<ChildMercenary> {
    entries.iter().find(|s| s.id == id).map(|s| ChildMercenary {
        id: s.id,
        name: s.name.to_string(),
        img_path: portrait_url(s.portrait),
        attributes_name: s.attribute.to_string(),
        country_name: s.country.to_string(),
        items: requirements(s.materials),
        class_type_name: class,
    })
}

fn build_catalog() -> Vec<Mercenary> {
    LEGENDS
        .iter()
        .map(|legend| {
            let awakened = legend
                .awakened
                .iter()
                .filter_map(|&id| child(AWAKENED, id, MercenaryClass::Awakened));
            let modified = legend
                .modified
                .iter()
                .filter_map(|&id| child(MODIFIED, id, MercenaryClass::Modified));

            Mercenary {
                id: legend.id,
                name: legend.name.to_string(),
                img_path: portrait_url(legend.portrait),
                attributes_name: legend.attribute.to_string(),
                country_name: legend.country.to_string(),
                items: requirements(legend.materials),
                class_type_name: MercenaryClass::Legendary,
                child_mercenaries: awakened.chain(modified).collect(),
            }
        })
        .collect()
}

/// Every legendary mercenary, newest first.
pub fn get_all_mercenaries() -> &'static [Mercenary] {
    static CATALOG: OnceLock<Vec<Mercenary>> = OnceLock::new();
    CATALOG.get_or_init(build_catalog)
}

pub fn get_mercenary_by_id(id: u32) -> Option<&'static Mercenary> {
    get_all_mercenaries().iter().find(|m| m.id == id)
}

/// Materials only obtainable in-game, never listed on the market.
pub fn is_modified_mercenary_item(item_name: &str) -> bool {
    MODIFIED
        .iter()
        .any(|unit| unit.materials.iter().any(|&(name, _)| name == item_name))
}

/// Distinct market-tradable materials across the catalog in first-seen
/// order: legendary recipes and awakened children. Modified children are
/// skipped since their materials cannot be bought.
pub fn all_unique_items() -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut items = Vec::new();
    for mercenary in get_all_mercenaries() {
        let child_items = mercenary
            .child_mercenaries
            .iter()
            .filter(|c| c.class_type_name != MercenaryClass::Modified)
            .flat_map(|c| c.items.iter());
        for item in mercenary.items.iter().chain(child_items) {
            if seen.insert(item.name.as_str()) {
                items.push(item.name.clone());
            }
        }
    }
    items
}
