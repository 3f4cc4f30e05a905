/*!
# SpeedWatch DevKit - Stubs et utilitaires de test

Bibliothèque facilitant les tests du kernel SpeedWatch avec:
- Sonde ESP32 scriptée (statuts rejoués dans l'ordre, compteur d'appels)
- Builders d'infractions pour des journaux sur mesure
- Harness HTTP qui pilote le routeur Axum sans ouvrir de socket
*/

pub mod fixtures;
pub mod probe_stub;
pub mod test_utils;

pub use fixtures::RecordBuilder;
pub use probe_stub::ScriptedProbe;
pub use test_utils::{TestHarness, TestResponse};
