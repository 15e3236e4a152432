//! Static checklist templates and category metadata.

use crate::models::checklist::{
    CategoryInfo, Priority,
    Priority::{High, Low, Medium},
    TripType,
};

#[derive(Debug, Clone, Copy)]
pub struct TemplateItem {
    pub text: &'static str,
    pub category: &'static str,
    pub priority: Priority,
}

const fn item(text: &'static str, category: &'static str, priority: Priority) -> TemplateItem {
    TemplateItem {
        text,
        category,
        priority,
    }
}

const LEISURE: &[TemplateItem] = &[
    item("Check passport validity (6+ months remaining)", "documents", High),
    item("Obtain travel visa if required", "documents", High),
    item("Print/save travel insurance documents", "documents", Medium),
    item("Make copies of important documents", "documents", Medium),
    item("Book accommodation", "booking", High),
    item("Book flights/transportation", "booking", High),
    item("Research and book activities/tours", "booking", Low),
    item("Make restaurant reservations", "booking", Low),
    item("Check vaccination requirements", "health", High),
    item("Pack prescription medications", "health", High),
    item("Pack first aid kit", "health", Medium),
    item("Notify bank of travel plans", "finance", High),
    item("Exchange currency or get travel card", "finance", Medium),
    item("Check international roaming plans", "communication", Medium),
    item("Pack weather-appropriate clothing", "packing", Medium),
    item("Pack electronics and chargers", "packing", Medium),
    item("Pack toiletries and personal items", "packing", Medium),
    item("Arrange pet/house sitting", "home", Medium),
    item("Stop mail/package delivery", "home", Low),
    item("Set home security systems", "home", Medium),
];

const BUSINESS: &[TemplateItem] = &[
    item("Check passport validity", "documents", High),
    item("Obtain business visa if required", "documents", High),
    item("Print business invitation letters", "documents", Medium),
    item("Prepare business cards", "documents", Medium),
    item("Book business-class accommodation", "booking", High),
    item("Arrange airport transfers", "booking", Medium),
    item("Book meeting rooms if needed", "booking", Medium),
    item("Prepare presentation materials", "work", High),
    item("Set up international phone/data plan", "communication", High),
    item("Download offline maps and translation apps", "communication", Medium),
    item("Pack laptop and work equipment", "packing", High),
    item("Pack formal business attire", "packing", High),
    item("Arrange corporate credit card/expense account", "finance", High),
    item("Keep all receipts for expense reports", "finance", Medium),
];

const ADVENTURE: &[TemplateItem] = &[
    item("Pack hiking boots and appropriate footwear", "gear", High),
    item("Pack weather-resistant clothing", "gear", High),
    item("Pack camping/outdoor gear", "gear", Medium),
    item("Pack navigation tools (GPS, compass, maps)", "gear", High),
    item("Pack emergency whistle and signal devices", "gear", Medium),
    item("Check weather conditions and alerts", "safety", High),
    item("Share itinerary with emergency contact", "safety", High),
    item("Pack comprehensive first aid kit", "safety", High),
    item("Research local emergency services", "safety", Medium),
    item("Get travel health insurance", "health", High),
    item("Pack water purification tablets/filter", "health", Medium),
    item("Pack high-energy snacks and food", "health", Medium),
    item("Obtain necessary permits/licenses", "permits", High),
    item("Book guided tours or equipment rentals", "booking", Medium),
];

const FAMILY: &[TemplateItem] = &[
    item("Check all family passports", "documents", High),
    item("Prepare consent letters for minors if applicable", "documents", High),
    item("Pack medical records for family members", "documents", Medium),
    item("Book family rooms/connecting rooms", "booking", High),
    item("Research family-friendly activities", "booking", Medium),
    item("Book child-friendly transportation options", "booking", Medium),
    item("Pack entertainment for kids (tablets, books, games)", "kids", High),
    item("Pack extra clothes for children", "kids", Medium),
    item("Pack children's medications and comfort items", "kids", High),
    item("Pack snacks and drinks for kids", "kids", Medium),
    item("Prepare ID tags/cards for children", "safety", High),
    item("Research pediatric healthcare at destination", "safety", Medium),
];

const ROMANTIC: &[TemplateItem] = &[
    item("Book romantic accommodation (honeymoon suite, etc.)", "booking", High),
    item("Make dinner reservations at romantic restaurants", "booking", High),
    item("Plan special activities or experiences", "booking", Medium),
    item("Book couples spa treatments", "booking", Low),
    item("Pack formal/evening wear", "packing", Medium),
    item("Pack special occasion items (jewelry, etc.)", "packing", Low),
    item("Prepare surprise gifts or cards", "special", Low),
    item("Research photogenic locations", "memories", Medium),
    item("Consider hiring a photographer for special moments", "memories", Low),
];

const CULTURAL: &[TemplateItem] = &[
    item("Research local customs and etiquette", "culture", High),
    item("Learn basic phrases in local language", "culture", Medium),
    item("Research cultural sites and museums", "culture", Medium),
    item("Book guided cultural tours", "booking", Medium),
    item("Pack culturally appropriate clothing", "packing", High),
    item("Research dress codes for religious sites", "culture", High),
    item("Download translation apps", "communication", Medium),
    item("Prepare journal for cultural experiences", "memories", Low),
];

const BACKPACKING: &[TemplateItem] = &[
    item("Choose appropriate backpack size", "gear", High),
    item("Pack lightweight, quick-dry clothing", "gear", High),
    item("Pack portable charger/power bank", "gear", High),
    item("Pack universal adapter", "gear", Medium),
    item("Research hostels and budget accommodation", "booking", High),
    item("Get travel insurance for extended trips", "documents", High),
    item("Prepare emergency cash in multiple currencies", "finance", Medium),
    item("Pack comprehensive medical kit", "health", High),
    item("Research local health risks and vaccinations", "health", High),
    item("Set up regular check-in schedule with family", "communication", Medium),
];

const LUXURY: &[TemplateItem] = &[
    item("Book luxury accommodation with premium amenities", "booking", High),
    item("Arrange private transfers and transportation", "booking", High),
    item("Make reservations at fine dining restaurants", "booking", Medium),
    item("Book premium spa and wellness treatments", "booking", Low),
    item("Pack formal evening wear", "packing", Medium),
    item("Pack quality accessories and jewelry", "packing", Low),
    item("Arrange concierge services", "services", Medium),
    item("Research exclusive experiences and events", "booking", Medium),
];

const ROAD_TRIP: &[TemplateItem] = &[
    item("Service vehicle (oil, brakes, tires)", "vehicle", High),
    item("Check spare tire and emergency kit", "vehicle", High),
    item("Plan fuel stops and routes", "planning", High),
    item("Download offline maps", "planning", Medium),
    item("Pack car chargers and adapters", "gear", Medium),
    item("Prepare road trip snacks and drinks", "food", Medium),
    item("Create road trip playlist", "entertainment", Low),
    item("Pack games and entertainment", "entertainment", Low),
    item("Ensure roadside assistance coverage", "safety", High),
    item("Pack emergency contact information", "safety", Medium),
];

const GROUP: &[TemplateItem] = &[
    item("Create shared itinerary and group chat", "coordination", High),
    item("Collect everyone's passport/ID information", "coordination", High),
    item("Coordinate group bookings and payments", "coordination", High),
    item("Plan group activities and free time", "coordination", Medium),
    item("Book group accommodation (adjoining rooms)", "booking", High),
    item("Arrange group transportation", "booking", High),
    item("Research group discounts and deals", "finance", Medium),
    item("Designate group leader/emergency contact", "safety", High),
    item("Share emergency contact information", "safety", Medium),
    item("Plan meeting points and procedures", "safety", Medium),
];

pub const UNIVERSAL_ITEMS: &[TemplateItem] = &[
    item("Check weather forecast", "planning", Medium),
    item("Confirm all bookings 24-48 hours before", "confirmation", High),
];

pub const MAIL_HOLD_ITEM: TemplateItem =
    item("Arrange mail hold/forwarding", "home", Medium);

pub const EXTENDED_ABSENCE_ITEM: TemplateItem =
    item("Notify employers/schools of extended absence", "planning", High);

pub const INTERNATIONAL_ITEMS: &[TemplateItem] = &[
    item("Check visa requirements", "documents", High),
    item("Research currency exchange rates", "finance", Medium),
    item("Check electrical outlet types and adapters", "gear", Medium),
];

pub const COMPANION_ITEMS: &[TemplateItem] = &[
    item("Coordinate packing lists with travel companions", "coordination", Low),
    item("Plan shared expenses and payment methods", "finance", Medium),
];

pub fn template(trip_type: TripType) -> &'static [TemplateItem] {
    match trip_type {
        TripType::Leisure => LEISURE,
        TripType::Business => BUSINESS,
        TripType::Adventure => ADVENTURE,
        TripType::Family => FAMILY,
        TripType::Romantic => ROMANTIC,
        TripType::Cultural => CULTURAL,
        TripType::Backpacking => BACKPACKING,
        TripType::Luxury => LUXURY,
        TripType::RoadTrip => ROAD_TRIP,
        TripType::Group => GROUP,
    }
}

/// Template for a raw trip type tag; unknown tags get the leisure template.
pub fn template_for_tag(tag: &str) -> &'static [TemplateItem] {
    template(TripType::from_tag(tag).unwrap_or_default())
}

const fn category(name: &'static str, icon: &'static str, color: &'static str) -> CategoryInfo {
    CategoryInfo { name, icon, color }
}

pub const CATEGORIES: [(&str, CategoryInfo); 22] = [
    ("documents", category("Documents & Legal", "📄", "blue")),
    ("booking", category("Bookings & Reservations", "🏨", "green")),
    ("health", category("Health & Medical", "🏥", "red")),
    ("finance", category("Money & Finance", "💳", "yellow")),
    ("communication", category("Communication & Tech", "📱", "purple")),
    ("packing", category("Packing & Gear", "🧳", "orange")),
    ("home", category("Home Preparation", "🏠", "gray")),
    ("planning", category("Planning & Research", "📋", "indigo")),
    ("safety", category("Safety & Emergency", "🚨", "red")),
    ("gear", category("Equipment & Gear", "🎒", "green")),
    ("culture", category("Cultural Preparation", "🏛️", "purple")),
    ("coordination", category("Group Coordination", "👥", "blue")),
    ("work", category("Work & Business", "💼", "gray")),
    ("kids", category("Children & Family", "👨‍👩‍👧‍👦", "pink")),
    ("special", category("Special Occasions", "💖", "pink")),
    ("memories", category("Photos & Memories", "📸", "yellow")),
    ("services", category("Services & Concierge", "🛎️", "gold")),
    ("vehicle", category("Vehicle & Transportation", "🚗", "blue")),
    ("food", category("Food & Dining", "🍽️", "orange")),
    ("entertainment", category("Entertainment", "🎵", "purple")),
    ("confirmation", category("Confirmations", "✅", "green")),
    ("permits", category("Permits & Licenses", "📜", "blue")),
];

pub const UNKNOWN_CATEGORY: CategoryInfo = category("Other", "📌", "gray");

pub fn category_info(tag: &str) -> Option<CategoryInfo> {
    CATEGORIES
        .iter()
        .find(|(key, _)| *key == tag)
        .map(|(_, info)| *info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_template_uses_known_categories() {
        for trip_type in TripType::ALL {
            for entry in template(trip_type) {
                assert!(
                    category_info(entry.category).is_some(),
                    "{trip_type}: unknown category {}",
                    entry.category
                );
            }
        }
    }

    #[test]
    fn unknown_tag_falls_back_to_leisure() {
        assert_eq!(template_for_tag("space_tourism").len(), LEISURE.len());
        assert_eq!(template_for_tag("group").len(), GROUP.len());
    }
}
