use std::collections::BTreeMap;

use crate::catalog::Device;
use crate::guide::node::{DecisionNode, DecisionOption};
use crate::guide::tree::DecisionTree;

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

fn ask(
    id: &str,
    question: &str,
    description: Option<&str>,
    options: Vec<DecisionOption>,
) -> DecisionNode {
    DecisionNode {
        id: id.into(),
        question: question.into(),
        description: description.map(Into::into),
        options,
        is_terminal: None,
        solution: None,
        additional_info: None,
    }
}

/// Option that moves on to another node.
fn go(id: &str, text: &str, next: &str) -> DecisionOption {
    DecisionOption {
        id: id.into(),
        text: text.into(),
        next_node_id: Some(next.into()),
        solution: None,
        action: None,
        additional_info: None,
    }
}

/// Option that ends the walk with an inline solution.
fn fix(id: &str, text: &str, solution: &str, info: Option<&str>) -> DecisionOption {
    DecisionOption {
        id: id.into(),
        text: text.into(),
        next_node_id: None,
        solution: Some(solution.into()),
        action: None,
        additional_info: info.map(Into::into),
    }
}

fn device(id: &str, name: &str, model: &str, core: &str, brand: &str, photo: &str) -> Device {
    Device {
        id: id.into(),
        name: name.into(),
        model: model.into(),
        core_device: core.into(),
        brand_name: brand.into(),
        image_url: Some(format!(
            "https://images.pexels.com/photos/{photo}/pexels-photo-{photo}.jpeg?auto=compress&cs=tinysrgb&w=300&h=200&fit=crop"
        )),
    }
}

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

pub fn devices() -> Vec<Device> {
    vec![
        device(
            "hair-dryer-pro-2024",
            "Hair Dryer Pro 2024",
            "HD-2024-PRO",
            "Hair Dryer",
            "L'Oréal",
            "3993449",
        ),
        device(
            "straightener-elite-x1",
            "Straightener Elite X1",
            "SE-X1-ELITE",
            "Hair Straightener",
            "L'Oréal",
            "3373736",
        ),
        device(
            "curling-iron-deluxe",
            "Curling Iron Deluxe",
            "CI-DLX-2024",
            "Curling Iron",
            "L'Oréal",
            "3641056",
        ),
        device(
            "facial-steamer-spa",
            "Facial Steamer Spa",
            "FS-SPA-PRO",
            "Facial Steamer",
            "L'Oréal",
            "3997991",
        ),
        device(
            "led-therapy-mask",
            "LED Therapy Mask",
            "LTM-2024",
            "LED Therapy Mask",
            "L'Oréal",
            "3997349",
        ),
        device(
            "epilator-precision-plus",
            "Epilator Precision Plus",
            "EP-PREC-PLUS",
            "Epilator",
            "L'Oréal",
            "4041392",
        ),
        device(
            "scalp-reader-loreal",
            "ScalpReader Pro",
            "SR-PRO-2024",
            "ScalpReader",
            "L'Oréal",
            "3997349",
        ),
        device(
            "kscan-armani",
            "KSCAN by Armani",
            "KSCAN-ARM-2024",
            "ScalpReader",
            "Armani",
            "3997349",
        ),
        device(
            "hair-dryer-armani",
            "Armani Hair Dryer Elite",
            "HD-ARM-ELITE",
            "Hair Dryer",
            "Armani",
            "3993449",
        ),
    ]
}

// ---------------------------------------------------------------------------
// Decision trees
// ---------------------------------------------------------------------------

/// Every built-in tree, keyed by device id.
pub fn decision_trees() -> BTreeMap<String, DecisionTree> {
    [hair_dryer_pro_scenario(), straightener_elite_scenario()]
        .into_iter()
        .map(|tree| (tree.device_id.clone(), tree))
        .collect()
}

pub fn hair_dryer_pro_scenario() -> DecisionTree {
    let nodes = vec![
        ask(
            "initial-problem",
            "What type of issue is the customer experiencing?",
            Some("Select the primary concern to begin troubleshooting"),
            vec![
                go("power-issue", "Device won't turn on / No power", "power-troubleshoot"),
                go("heat-issue", "Not heating properly / Temperature issues", "heat-troubleshoot"),
                go("airflow-issue", "Weak airflow / Fan problems", "airflow-troubleshoot"),
                go("noise-issue", "Unusual noise / Vibration", "noise-troubleshoot"),
                go("physical-damage", "Physical damage / Cord issues", "damage-assessment"),
            ],
        ),
        ask(
            "power-troubleshoot",
            "Is the device plugged into a working outlet?",
            Some("First, let's verify the power source"),
            vec![
                go("outlet-working", "Yes, outlet is working (tested with another device)", "check-power-button"),
                go("outlet-not-working", "No, or outlet hasn't been tested", "test-outlet"),
            ],
        ),
        ask(
            "test-outlet",
            "After testing the outlet with another device, does it work?",
            Some("Have the customer test the outlet with a lamp or other device"),
            vec![
                go("outlet-confirmed-working", "Yes, outlet works with other devices", "check-power-button"),
                fix(
                    "outlet-not-working-confirmed",
                    "No, outlet is not working",
                    "The issue is with the electrical outlet, not the device. Advise customer to contact an electrician or try a different outlet.",
                    None,
                ),
            ],
        ),
        ask(
            "check-power-button",
            "Does the power button click properly when pressed?",
            Some("Check if the power button feels normal and responsive"),
            vec![
                go("button-clicks-normally", "Yes, button clicks normally", "check-cord-damage"),
                fix(
                    "button-stuck-loose",
                    "No, button is stuck, loose, or unresponsive",
                    "Power button mechanism is faulty. Device requires repair or replacement. Check warranty status and process RMA if applicable.",
                    None,
                ),
            ],
        ),
        ask(
            "check-cord-damage",
            "Is there any visible damage to the power cord?",
            Some("Look for cuts, kinks, exposed wires, or bent plugs"),
            vec![
                fix(
                    "cord-undamaged",
                    "No visible damage to cord",
                    "Internal electrical fault suspected. Device requires professional repair. Check warranty status and initiate RMA process.",
                    Some("Log this as an internal electrical failure. Estimated repair time: 5-7 business days."),
                ),
                fix(
                    "cord-damaged",
                    "Yes, visible damage to power cord",
                    "Power cord is damaged and unsafe to use. Device requires repair or replacement. Do not advise customer to continue using. Process immediate RMA.",
                    Some("Safety concern - prioritize this case. Replacement cord may be available depending on warranty terms."),
                ),
            ],
        ),
        ask(
            "heat-troubleshoot",
            "Does the device turn on but produce no heat, or does it produce some heat but not enough?",
            None,
            vec![
                go("no-heat-at-all", "Device turns on but produces no heat at all", "heat-setting-check"),
                go("insufficient-heat", "Device produces some heat but not as hot as expected", "heat-setting-max"),
            ],
        ),
        ask(
            "heat-setting-check",
            "Is the heat setting turned to maximum?",
            Some("Verify the temperature control is set to highest setting"),
            vec![
                fix(
                    "heat-on-max",
                    "Yes, heat setting is on maximum",
                    "Heating element failure. Device requires repair. The heating coil likely needs replacement. Check warranty and process RMA.",
                    Some("Common issue after 12+ months of use. Replacement heating element available for in-warranty devices."),
                ),
                fix(
                    "heat-not-max",
                    "No, heat was not on maximum setting",
                    "Advise customer to set heat to maximum and test again. If still no heat after setting to max, heating element has failed and device needs repair.",
                    None,
                ),
            ],
        ),
        ask(
            "heat-setting-max",
            "How long has the customer owned this device?",
            Some("Check purchase date or warranty information"),
            vec![
                fix(
                    "recent-purchase",
                    "Less than 6 months",
                    "Defective heating element from manufacturing. Full replacement warranted. Process immediate RMA for new device.",
                    Some("Manufacturing defect - expedite replacement process."),
                ),
                fix(
                    "older-device",
                    "6 months or more",
                    "Normal wear on heating element. Performance degradation expected over time. Check warranty status - may qualify for discounted replacement.",
                    Some("Normal wear pattern. Offer maintenance tips to extend device life."),
                ),
            ],
        ),
        ask(
            "airflow-troubleshoot",
            "When did the customer last clean the air intake filter?",
            Some("Check maintenance history"),
            vec![
                go("recently-cleaned", "Within the last month", "check-obstruction"),
                fix(
                    "not-recently-cleaned",
                    "More than a month ago or never",
                    "Clogged air filter is likely cause. Guide customer through cleaning process: Remove back filter, rinse with warm water, let dry completely, reinstall. Test device after cleaning.",
                    Some("Recommend monthly filter cleaning for optimal performance."),
                ),
            ],
        ),
        ask(
            "check-obstruction",
            "Is there any visible hair or debris in the air intake or outlet?",
            None,
            vec![
                fix(
                    "no-obstruction",
                    "No visible obstruction",
                    "Internal fan motor issue suspected. Device requires professional service. Fan motor may need replacement or repair.",
                    Some("Motor replacement typically covered under warranty for first 24 months."),
                ),
                fix(
                    "obstruction-found",
                    "Yes, hair or debris visible",
                    "Remove visible debris carefully with tweezers (device unplugged). Clean thoroughly and test. If airflow still weak after cleaning, internal motor service needed.",
                    None,
                ),
            ],
        ),
        ask(
            "noise-troubleshoot",
            "What type of noise is the device making?",
            None,
            vec![
                fix(
                    "grinding-noise",
                    "Grinding or scraping sound",
                    "Foreign object in fan mechanism or worn bearings. Stop using immediately - potential safety hazard. Device requires immediate professional service.",
                    Some("Safety priority - advise immediate discontinuation of use."),
                ),
                fix(
                    "rattling-noise",
                    "Rattling or vibrating sound",
                    "Loose internal component or unbalanced fan. Device should be serviced to prevent further damage. Safe to use temporarily at lower speeds.",
                    None,
                ),
                fix(
                    "high-pitched-whine",
                    "High-pitched whining sound",
                    "Motor bearing wear or overheating. Reduce usage frequency and schedule service. Motor may need lubrication or replacement.",
                    Some("Early intervention can prevent complete motor failure."),
                ),
            ],
        ),
        ask(
            "damage-assessment",
            "What type of physical damage is present?",
            None,
            vec![
                fix(
                    "cord-damage-visible",
                    "Power cord has cuts, kinks, or exposed wires",
                    "Cord damage creates serious safety hazard. Device must not be used. Immediate replacement or repair required. Check if cord damage is covered under warranty terms.",
                    Some("SAFETY CRITICAL - emphasize danger of electrical shock or fire."),
                ),
                fix(
                    "housing-cracks",
                    "Cracks in plastic housing",
                    "Structural damage may affect safety and performance. Assess if cracks expose internal components. Minor cosmetic cracks may not require immediate service.",
                    Some("Photo documentation recommended for warranty claims."),
                ),
                fix(
                    "buttons-damaged",
                    "Control buttons are broken or missing",
                    "Control panel replacement needed. Device may be unsafe to operate without proper controls. Check availability of replacement control assembly.",
                    None,
                ),
            ],
        ),
    ];

    DecisionTree::from_nodes("hair-dryer-pro-2024", "initial-problem", nodes)
}

pub fn straightener_elite_scenario() -> DecisionTree {
    let nodes = vec![
        ask(
            "straightener-initial",
            "What issue is the customer experiencing with their straightener?",
            None,
            vec![
                go("not-heating", "Device not heating up", "straightener-power-check"),
                fix(
                    "uneven-heating",
                    "Plates heating unevenly",
                    "Uneven plate heating indicates internal sensor or heating element issues. Device requires professional calibration or repair.",
                    None,
                ),
                fix(
                    "plates-sticking",
                    "Plates are sticky or pulling hair",
                    "Clean plates with appropriate cleaning solution. If problem persists after cleaning, plate coating may be damaged and require replacement.",
                    Some("Recommend ceramic plate cleaner for maintenance."),
                ),
            ],
        ),
        ask(
            "straightener-power-check",
            "Does the power indicator light turn on?",
            None,
            vec![
                fix(
                    "light-on",
                    "Yes, power light is on",
                    "Power is reaching device but heating elements have failed. Internal repair required for heating element replacement.",
                    None,
                ),
                fix(
                    "light-off",
                    "No, no power light",
                    "Check power connection and outlet. If outlet works with other devices, the straightener has an internal electrical fault and needs repair.",
                    None,
                ),
            ],
        ),
    ];

    DecisionTree::from_nodes("straightener-elite-x1", "straightener-initial", nodes)
}
