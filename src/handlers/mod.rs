// Request handlers, one module per route family:
//
// src/handlers/
// ├── echo.rs       ← GET /echo
// ├── data.rs       ← generic /api/:collection CRUD
// ├── register.rs   ← POST /api/register
// ├── password.rs   ← PUT /api/change-password
// └── build/
//     ├── search.rs      ← GET /api/build/{collab,staff}/:id
//     └── data_table.rs  ← /api/build/:buildId/dataTable[/:id]

pub mod build;
pub mod data;
pub mod echo;
pub mod password;
pub mod register;
