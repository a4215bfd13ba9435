#![allow(clippy::unwrap_used)]
// Integration tests for server-side operations: group membership, MDM
// commands, management history, distribution point selection and the
// edits that are checked against the server before they touch an object.

use std::net::Ipv4Addr;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use jamf_core::lookup::Ident;
use jamf_core::mixins::HistoryStatus;
use jamf_core::resources::ComputerGroup;
use jamf_core::{
    ApiObject, Categorizable, Computer, ComputerCommand, ConnectionConfig, Extendable, Jss,
    JssError, MobileDeviceCommand, ObjectState, Policy, ScopeKey, Scopable, SelfServable, Sitable,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Jss) {
    let server = MockServer::start().await;
    let url = Url::parse(&server.uri()).unwrap();
    let config = ConnectionConfig::basic(url, "api-user", "s3cret".to_string().into());
    (server, Jss::new(&config).unwrap())
}

async fn mount_get(server: &MockServer, rsrc: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/JSSResource/{rsrc}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_computers(server: &MockServer) {
    mount_get(
        server,
        "computers/subset/basic",
        json!({
            "computers": [
                { "id": 7, "name": "Mac-07", "serial_number": "C02X7", "managed": true },
                { "id": 8, "name": "Mac-08", "serial_number": "C02X8", "managed": true },
                { "id": 9, "name": "Kiosk", "serial_number": "C02X9", "managed": false }
            ]
        }),
    )
    .await;
}

// ── Group membership ────────────────────────────────────────────────

#[tokio::test]
async fn test_change_group_membership_puts_delta_and_reloads() {
    let (server, jss) = setup().await;
    mount_computers(&server).await;
    mount_get(
        &server,
        "computergroups",
        json!({ "computer_groups": [{ "id": 5, "name": "Staff Macs", "is_smart": false }] }),
    )
    .await;

    // First GET is the initial fetch; the reload after the PUT sees the new members.
    Mock::given(method("GET"))
        .and(path("/JSSResource/computergroups/id/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "computer_group": {
                "id": 5, "name": "Staff Macs", "is_smart": false,
                "criteria": [], "computers": [{ "id": 7, "name": "Mac-07" }]
            }
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/JSSResource/computergroups/id/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "computer_group": {
                "id": 5, "name": "Staff Macs", "is_smart": false,
                "criteria": [], "computers": [{ "id": 8, "name": "Mac-08" }]
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/JSSResource/computergroups/id/5"))
        .and(body_string_contains(
            "<computer_additions><computer><id>8</id></computer></computer_additions>",
        ))
        .and(body_string_contains(
            "<computer_deletions><computer><id>7</id></computer></computer_deletions>",
        ))
        .respond_with(ResponseTemplate::new(201).set_body_string("<computer_group><id>5</id></computer_group>"))
        .expect(1)
        .mount(&server)
        .await;

    let mut group: ComputerGroup = jss.fetch("Staff Macs").await.unwrap();
    assert_eq!(group.members().len(), 1);

    jss.change_group_membership(&mut group, &["C02X8".into()], &[Ident::Id(7)])
        .await
        .unwrap();

    let names: Vec<_> = group.members().iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Mac-08"]);
}

#[tokio::test]
async fn test_membership_change_with_unknown_member_sends_nothing() {
    let (server, jss) = setup().await;
    mount_computers(&server).await;
    mount_get(
        &server,
        "computergroups/id/5",
        json!({
            "computer_group": {
                "id": 5, "name": "Staff Macs", "is_smart": false,
                "criteria": [], "computers": []
            }
        }),
    )
    .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let mut group: ComputerGroup = jss.fetch_by_id(5).await.unwrap();
    let err = jss
        .change_group_membership(&mut group, &["Mac-07".into(), "Mac-404".into()], &[])
        .await
        .unwrap_err();
    assert!(matches!(err, JssError::NoSuchItem(_)), "got {err:?}");
}

// ── MDM commands ────────────────────────────────────────────────────

#[tokio::test]
async fn test_computer_command_targets_managed_ids() {
    let (server, jss) = setup().await;
    mount_computers(&server).await;

    Mock::given(method("POST"))
        .and(path("/JSSResource/computercommands/command/BlankPush/id/7,8"))
        .respond_with(ResponseTemplate::new(201).set_body_string(
            "<computer_command><command><name>BlankPush</name>\
             <command_uuid>A-1</command_uuid><computer_id>7</computer_id></command>\
             <command><command_uuid>A-2</command_uuid><computer_id>8</computer_id></command>\
             </computer_command>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let receipt = jss
        .send_computer_command(&["Mac-07".into(), "C02X8".into(), 7.into()], ComputerCommand::BlankPush)
        .await
        .unwrap();
    assert_eq!(receipt.targets, vec![7, 8]);
    assert_eq!(receipt.uuids, vec!["A-1".to_owned(), "A-2".to_owned()]);
}

#[tokio::test]
async fn test_command_to_unmanaged_computer_is_refused() {
    let (server, jss) = setup().await;
    mount_computers(&server).await;

    let err = jss
        .send_computer_command(&["Kiosk".into()], ComputerCommand::BlankPush)
        .await
        .unwrap_err();
    assert!(matches!(err, JssError::Unmanaged(_)), "got {err:?}");
}

#[tokio::test]
async fn test_mobile_command_posts_document() {
    let (server, jss) = setup().await;
    mount_get(
        &server,
        "mobiledevices",
        json!({
            "mobile_devices": [
                { "id": 3, "name": "iPad-3", "serial_number": "DMP3", "managed": true }
            ]
        }),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/JSSResource/mobiledevicecommands/command"))
        .and(body_string_contains("<command>UpdateInventory</command>"))
        .and(body_string_contains("<id>3</id>"))
        .respond_with(ResponseTemplate::new(201).set_body_string(
            "<mobile_device_command><uuid>M-9</uuid></mobile_device_command>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let receipt = jss
        .send_mobile_command(&["DMP3".into()], MobileDeviceCommand::UpdateInventory)
        .await
        .unwrap();
    assert_eq!(receipt.command, "UpdateInventory");
    assert_eq!(receipt.uuids, vec!["M-9".to_owned()]);
}

// ── History ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_computer_history_groups_commands_by_status() {
    let (server, jss) = setup().await;
    mount_computers(&server).await;
    mount_get(
        &server,
        "computerhistory/id/7",
        json!({
            "computer_history": {
                "general": { "id": 7, "name": "Mac-07" },
                "commands": {
                    "completed": [
                        { "name": "BlankPush", "completed_epoch": 1_700_000_000_000_i64 },
                        { "name": "DeviceLock", "completed_epoch": 1_700_000_500_000_i64 }
                    ],
                    "pending": [{ "name": "EraseDevice", "issued_epoch": 1_700_000_600_000_i64 }],
                    "failed": []
                },
                "policy_logs": []
            }
        }),
    )
    .await;

    let history = jss.computer_history("C02X7").await.unwrap();
    assert_eq!(history.completed_commands().count(), 2);
    assert_eq!(history.commands_with_status(HistoryStatus::Pending).count(), 1);
    assert_eq!(history.last_completed_command().unwrap().name, "DeviceLock");
}

// ── Distribution points ─────────────────────────────────────────────

#[tokio::test]
async fn test_distribution_point_for_ip_prefers_smallest_segment() {
    let (server, jss) = setup().await;
    mount_get(
        &server,
        "networksegments",
        json!({
            "network_segments": [
                { "id": 1, "name": "Campus", "starting_address": "10.0.0.0", "ending_address": "10.0.255.255" },
                { "id": 2, "name": "Lab", "starting_address": "10.0.4.0", "ending_address": "10.0.4.255" },
                { "id": 3, "name": "Branch", "starting_address": "192.168.1.0", "ending_address": "192.168.1.255" }
            ]
        }),
    )
    .await;
    mount_get(
        &server,
        "networksegments/id/1",
        json!({ "network_segment": {
            "id": 1, "name": "Campus", "starting_address": "10.0.0.0",
            "ending_address": "10.0.255.255", "distribution_point": "Campus DP"
        }}),
    )
    .await;
    mount_get(
        &server,
        "networksegments/id/2",
        json!({ "network_segment": {
            "id": 2, "name": "Lab", "starting_address": "10.0.4.0",
            "ending_address": "10.0.4.255", "distribution_point": "Lab DP"
        }}),
    )
    .await;
    mount_get(
        &server,
        "distributionpoints",
        json!({ "distribution_points": [
            { "id": 20, "name": "Campus DP" },
            { "id": 21, "name": "Lab DP" }
        ]}),
    )
    .await;
    mount_get(
        &server,
        "distributionpoints/id/21",
        json!({ "distribution_point": {
            "id": 21, "name": "Lab DP", "ip_address": "lab-files.example.com", "is_master": false
        }}),
    )
    .await;
    mount_get(
        &server,
        "distributionpoints/id/20",
        json!({ "distribution_point": {
            "id": 20, "name": "Campus DP", "ip_address": "files.example.com", "is_master": true
        }}),
    )
    .await;

    let dp = jss
        .distribution_point_for_ip(Ipv4Addr::new(10, 0, 4, 17))
        .await
        .unwrap();
    assert_eq!(dp.name(), "Lab DP");

    // Outside every segment with a distribution point: the master.
    let dp = jss
        .distribution_point_for_ip(Ipv4Addr::new(172, 16, 0, 1))
        .await
        .unwrap();
    assert_eq!(dp.name(), "Campus DP");
    assert!(dp.is_master());
}

// ── Server-checked edits ────────────────────────────────────────────

fn loaded_computer() -> Computer {
    Computer::from_json(&json!({ "general": { "id": 7, "name": "Mac-07" } })).unwrap()
}

fn loaded_policy() -> Policy {
    Policy::from_json(&json!({ "general": { "id": 30, "name": "Install Chrome" } })).unwrap()
}

async fn mount_ea_defs(server: &MockServer) {
    mount_get(
        server,
        "computerextensionattributes",
        json!({ "computer_extension_attributes": [
            { "id": 1, "name": "Battery Health" },
            { "id": 2, "name": "Department Code" },
            { "id": 3, "name": "Asset Owner" }
        ]}),
    )
    .await;
    mount_get(
        server,
        "computerextensionattributes/id/1",
        json!({ "computer_extension_attribute": {
            "id": 1, "name": "Battery Health", "data_type": "String",
            "input_type": { "type": "script", "script": "#!/bin/sh\necho ok" }
        }}),
    )
    .await;
    mount_get(
        server,
        "computerextensionattributes/id/2",
        json!({ "computer_extension_attribute": {
            "id": 2, "name": "Department Code", "data_type": "String",
            "input_type": { "type": "Pop-up Menu", "popup_choices": ["ENG", "OPS"] }
        }}),
    )
    .await;
    mount_get(
        server,
        "computerextensionattributes/id/3",
        json!({ "computer_extension_attribute": {
            "id": 3, "name": "Asset Owner", "data_type": "String",
            "input_type": { "type": "Text Field" }
        }}),
    )
    .await;
}

async fn mount_ldap(server: &MockServer) {
    mount_get(
        server,
        "ldapservers",
        json!({ "ldap_servers": [{ "id": 1, "name": "Corp AD" }] }),
    )
    .await;
    mount_get(
        server,
        "ldapservers/id/1",
        json!({ "ldap_server": { "connection": {
            "id": 1, "name": "Corp AD", "hostname": "ad.example.com"
        }}}),
    )
    .await;
}

#[tokio::test]
async fn test_ext_attr_filled_by_script_is_unsupported() {
    let (server, jss) = setup().await;
    mount_ea_defs(&server).await;
    let mut computer = loaded_computer();

    let err = jss
        .set_ext_attr(&mut computer, "Battery Health", "Good")
        .await
        .unwrap_err();
    assert!(matches!(err, JssError::Unsupported(_)), "got {err:?}");
    assert_eq!(computer.state(), ObjectState::Clean);
}

#[tokio::test]
async fn test_ext_attr_popup_value_must_be_a_choice() {
    let (server, jss) = setup().await;
    mount_ea_defs(&server).await;
    let mut computer = loaded_computer();

    let err = jss
        .set_ext_attr(&mut computer, "Department Code", "HR")
        .await
        .unwrap_err();
    assert!(matches!(err, JssError::InvalidData(_)), "got {err:?}");
    assert_eq!(computer.state(), ObjectState::Clean);

    jss.set_ext_attr(&mut computer, "Department Code", "OPS")
        .await
        .unwrap();
    assert_eq!(computer.ext_attr("Department Code"), Some("OPS"));
    assert_eq!(computer.state(), ObjectState::Dirty);
}

#[tokio::test]
async fn test_ext_attr_unknown_definition_is_no_such_item() {
    let (server, jss) = setup().await;
    mount_ea_defs(&server).await;
    let mut computer = loaded_computer();

    let err = jss
        .set_ext_attr(&mut computer, "Warranty End", "2027-01-01")
        .await
        .unwrap_err();
    assert!(matches!(err, JssError::NoSuchItem(_)), "got {err:?}");

    jss.set_ext_attr(&mut computer, "Asset Owner", "IT")
        .await
        .unwrap();
    assert!(computer.need_to_update());
}

#[tokio::test]
async fn test_scope_target_must_exist_and_marks_dirty() {
    let (server, jss) = setup().await;
    mount_computers(&server).await;
    let mut policy = loaded_policy();

    let err = jss
        .add_scope_target(&mut policy, ScopeKey::Computers, "Mac-99")
        .await
        .unwrap_err();
    assert!(matches!(err, JssError::NoSuchItem(_)), "got {err:?}");
    assert_eq!(policy.state(), ObjectState::Clean);

    assert!(jss
        .add_scope_target(&mut policy, ScopeKey::Computers, "mac-07")
        .await
        .unwrap());
    assert_eq!(policy.state(), ObjectState::Dirty);
    let targets = policy.scope().targets(ScopeKey::Computers);
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].id, Some(7));
    assert_eq!(targets[0].name, "Mac-07");

    // Already a target, so it cannot also be excluded.
    let err = jss
        .add_scope_exclusion(&mut policy, ScopeKey::Computers, "Mac-07")
        .await
        .unwrap_err();
    assert!(matches!(err, JssError::InvalidData(_)), "got {err:?}");
}

#[tokio::test]
async fn test_scope_exclusion_of_unknown_group_is_no_such_item() {
    let (server, jss) = setup().await;
    mount_get(
        &server,
        "computergroups",
        json!({ "computer_groups": [{ "id": 5, "name": "Staff Macs", "is_smart": false }] }),
    )
    .await;
    let mut policy = loaded_policy();

    let err = jss
        .add_scope_exclusion(&mut policy, ScopeKey::ComputerGroups, "Kiosks")
        .await
        .unwrap_err();
    assert!(matches!(err, JssError::NoSuchItem(_)), "got {err:?}");

    assert!(jss
        .add_scope_exclusion(&mut policy, ScopeKey::ComputerGroups, "Staff Macs")
        .await
        .unwrap());
    assert_eq!(policy.scope().exclusions(ScopeKey::ComputerGroups)[0].id, Some(5));
}

#[tokio::test]
async fn test_set_scope_targets_checks_every_item_first() {
    let (server, jss) = setup().await;
    mount_computers(&server).await;
    let mut policy = loaded_policy();

    let err = jss
        .set_scope_targets(&mut policy, ScopeKey::Computers, &["Mac-07", "Mac-99"])
        .await
        .unwrap_err();
    assert!(matches!(err, JssError::NoSuchItem(_)), "got {err:?}");
    assert!(policy.scope().targets(ScopeKey::Computers).is_empty());
    assert_eq!(policy.state(), ObjectState::Clean);

    jss.set_scope_targets(&mut policy, ScopeKey::Computers, &["Mac-07", "8"])
        .await
        .unwrap();
    let ids: Vec<_> = policy
        .scope()
        .targets(ScopeKey::Computers)
        .iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec![Some(7), Some(8)]);
    assert_eq!(policy.state(), ObjectState::Dirty);
}

#[tokio::test]
async fn test_scope_limitation_to_unknown_ldap_user_is_no_such_item() {
    let (server, jss) = setup().await;
    mount_ldap(&server).await;
    mount_get(&server, "ldapservers/id/1/user/ghost", json!({ "ldap_users": [] })).await;
    mount_get(
        &server,
        "ldapservers/id/1/user/jdoe",
        json!({ "ldap_users": [{ "ldap_user": { "username": "jdoe", "realname": "J Doe" } }] }),
    )
    .await;
    let mut policy = loaded_policy();

    let err = jss
        .add_scope_limitation(&mut policy, ScopeKey::Users, "ghost")
        .await
        .unwrap_err();
    assert!(matches!(err, JssError::NoSuchItem(_)), "got {err:?}");

    assert!(jss
        .add_scope_limitation(&mut policy, ScopeKey::Users, "jdoe")
        .await
        .unwrap());
    let users = policy.scope().limitations(ScopeKey::Users);
    assert_eq!(users[0].id, None);
    assert_eq!(users[0].name, "jdoe");
}

#[tokio::test]
async fn test_ldap_user_in_group_asks_each_server() {
    let (server, jss) = setup().await;
    mount_ldap(&server).await;
    mount_get(
        &server,
        "ldapservers/id/1/group/Staff/user/jdoe",
        json!({ "ldap_users": [{ "ldap_user": { "username": "jdoe" } }] }),
    )
    .await;
    mount_get(
        &server,
        "ldapservers/id/1/group/Staff/user/ghost",
        json!({ "ldap_users": [] }),
    )
    .await;

    assert!(jss.ldap_user_in_group("jdoe", "Staff").await.unwrap());
    assert!(!jss.ldap_user_in_group("ghost", "Staff").await.unwrap());
}

#[tokio::test]
async fn test_ldap_lookup_without_servers_is_missing_data() {
    let (server, jss) = setup().await;
    mount_get(&server, "ldapservers", json!({ "ldap_servers": [] })).await;

    let err = jss.ldap_user_in_group("jdoe", "Staff").await.unwrap_err();
    assert!(matches!(err, JssError::MissingData(_)), "got {err:?}");
}

#[tokio::test]
async fn test_category_and_site_must_exist() {
    let (server, jss) = setup().await;
    mount_get(
        &server,
        "categories",
        json!({ "categories": [{ "id": 4, "name": "Browsers" }] }),
    )
    .await;
    mount_get(&server, "sites", json!({ "sites": [{ "id": 2, "name": "Berlin" }] })).await;
    let mut policy = loaded_policy();

    let err = jss.set_category(&mut policy, Some("Games")).await.unwrap_err();
    assert!(matches!(err, JssError::NoSuchItem(_)), "got {err:?}");
    let err = jss.set_site(&mut policy, Some("Tokyo")).await.unwrap_err();
    assert!(matches!(err, JssError::NoSuchItem(_)), "got {err:?}");
    assert_eq!(policy.state(), ObjectState::Clean);

    // Stored under the server's spelling.
    jss.set_category(&mut policy, Some("browsers")).await.unwrap();
    jss.set_site(&mut policy, Some("Berlin")).await.unwrap();
    assert_eq!(policy.category().id, Some(4));
    assert_eq!(policy.category().name.as_deref(), Some("Browsers"));
    assert_eq!(policy.site().id, Some(2));
    assert_eq!(policy.state(), ObjectState::Dirty);
}

#[tokio::test]
async fn test_self_service_category_rules() {
    let (server, jss) = setup().await;
    mount_get(
        &server,
        "categories",
        json!({ "categories": [{ "id": 4, "name": "Browsers" }] }),
    )
    .await;
    let mut policy = loaded_policy();

    let err = jss
        .add_self_service_category(&mut policy, "Browsers", false, true)
        .await
        .unwrap_err();
    assert!(matches!(err, JssError::InvalidData(_)), "got {err:?}");
    let err = jss
        .add_self_service_category(&mut policy, "Games", true, false)
        .await
        .unwrap_err();
    assert!(matches!(err, JssError::NoSuchItem(_)), "got {err:?}");
    assert_eq!(policy.state(), ObjectState::Clean);

    jss.add_self_service_category(&mut policy, "Browsers", true, true)
        .await
        .unwrap();
    let cats = &policy.self_service().categories;
    assert_eq!(cats.len(), 1);
    assert_eq!(cats[0].id, 4);
    assert!(cats[0].feature_in);
    assert_eq!(policy.state(), ObjectState::Dirty);
}

#[tokio::test]
async fn test_match_records_returns_summary_entries() {
    let (server, jss) = setup().await;
    mount_get(
        &server,
        "computers/match/Mac*",
        json!({ "computers": [
            { "id": 7, "name": "Mac-07", "serial_number": "C02X7" },
            { "id": 8, "name": "Mac-08", "serial_number": "C02X8" }
        ]}),
    )
    .await;

    let found = jss.match_records::<Computer>("Mac*").await.unwrap();
    let names: Vec<_> = found.iter().filter_map(|e| e.name()).collect();
    assert_eq!(names, vec!["Mac-07", "Mac-08"]);
    assert_eq!(found[1].get_str("serial_number").as_deref(), Some("C02X8"));
}

#[tokio::test]
async fn test_upload_checks_type_state_and_file() {
    let (server, jss) = setup().await;
    Mock::given(method("POST"))
        .and(path("/JSSResource/fileuploads/policies/id/30"))
        .and(body_string_contains("icon.png"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let icon = dir.path().join("icon.png");
    std::fs::write(&icon, b"PNG icon bytes").unwrap();
    let policy = loaded_policy();

    let err = jss.upload(&policy, "attachment", &icon).await.unwrap_err();
    assert!(matches!(err, JssError::InvalidData(_)), "got {err:?}");

    let unsaved = <Policy as jamf_core::Creatable>::new_unsaved("Draft");
    let err = jss.upload(&unsaved, "icon", &icon).await.unwrap_err();
    assert!(matches!(err, JssError::NoSuchItem(_)), "got {err:?}");

    let missing = dir.path().join("missing.png");
    let err = jss.upload(&policy, "icon", &missing).await.unwrap_err();
    assert!(matches!(err, JssError::NoSuchItem(_)), "got {err:?}");

    jss.upload(&policy, "icon", &icon).await.unwrap();
}
